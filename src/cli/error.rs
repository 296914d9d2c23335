//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::exitcode;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => exitcode::USAGE,
            CliError::Infra(InfraError::Application(e)) => application_exit_code(e),
        }
    }
}

fn application_exit_code(e: &ApplicationError) -> i32 {
    match e {
        ApplicationError::Domain(d) if d.is_format_error() => exitcode::DATAERR,
        ApplicationError::Domain(DomainError::EmptyPath) => exitcode::DATAERR,
        ApplicationError::Domain(_) => exitcode::IOERR,
        ApplicationError::InputDirNotFound(_)
        | ApplicationError::NoShards { .. }
        | ApplicationError::SnapshotNotFound(_) => exitcode::NOINPUT,
        ApplicationError::SnapshotExists(_) => exitcode::CANTCREAT,
        ApplicationError::Config { .. } => exitcode::CONFIG,
        ApplicationError::OperationFailed { .. } => exitcode::IOERR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn given_missing_snapshot_when_mapping_then_noinput() {
        let err: CliError = ApplicationError::SnapshotNotFound(PathBuf::from("x.bin")).into();
        assert_eq!(err.exit_code(), exitcode::NOINPUT);
    }

    #[test]
    fn given_corrupt_snapshot_when_mapping_then_dataerr() {
        let err: CliError = ApplicationError::from(DomainError::BadMagic).into();
        assert_eq!(err.exit_code(), exitcode::DATAERR);
    }

    #[test]
    fn given_existing_snapshot_when_mapping_then_cantcreat() {
        let err: CliError = ApplicationError::SnapshotExists(PathBuf::from("x.bin")).into();
        assert_eq!(err.exit_code(), exitcode::CANTCREAT);
    }
}
