//! Domain-level errors (no external dependencies)

use std::io;

use thiserror::Error;

/// Domain errors cover trie construction and the snapshot format.
/// Malformed input records never surface here: the builder skips them.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("path must contain at least one symbol")]
    EmptyPath,

    #[error("failed to read records from {name}")]
    SourceRead {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("not a trie snapshot: magic bytes mismatch")]
    BadMagic,

    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("corrupt snapshot at byte {offset}: {reason}")]
    CorruptSnapshot { offset: u64, reason: String },

    #[error("snapshot I/O failed")]
    SnapshotIo(#[source] io::Error),
}

impl DomainError {
    pub(crate) fn corrupt(offset: u64, reason: impl Into<String>) -> Self {
        Self::CorruptSnapshot {
            offset,
            reason: reason.into(),
        }
    }

    /// True for errors caused by snapshot content rather than I/O.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::BadMagic | Self::UnsupportedVersion { .. } | Self::CorruptSnapshot { .. }
        )
    }
}

/// Result type for trie operations.
pub type TreeResult<T> = Result<T, DomainError>;
