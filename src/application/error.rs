//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add file-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("input directory not found: {0}")]
    InputDirNotFound(PathBuf),

    #[error("no shard files matching {prefix}*.{extension} in {dir}")]
    NoShards {
        dir: PathBuf,
        prefix: String,
        extension: String,
    },

    #[error("snapshot not found: {0}")]
    SnapshotNotFound(PathBuf),

    #[error("snapshot already exists (use --force to rebuild): {0}")]
    SnapshotExists(PathBuf),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
