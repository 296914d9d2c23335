//! Frequency records: one `<path>\t<frequency>` line of a shard.

use thiserror::Error;

/// A parsed shard line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub path: String,
    pub frequency: u64,
}

/// A line that cannot be turned into a [`Record`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct MalformedRecord {
    pub message: String,
}

impl MalformedRecord {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Record {
    /// Parse one shard line.
    ///
    /// Surrounding whitespace is trimmed first. The remainder must hold exactly
    /// two tab-separated fields: a non-empty path and a base-10 non-negative
    /// frequency.
    pub fn parse(line: &str) -> Result<Self, MalformedRecord> {
        let mut fields = line.trim().split('\t');
        let (path, frequency) = match (fields.next(), fields.next(), fields.next()) {
            (Some(path), Some(frequency), None) => (path, frequency),
            (_, None, _) => return Err(MalformedRecord::new("missing tab separator")),
            _ => return Err(MalformedRecord::new("more than two fields")),
        };
        if path.is_empty() {
            return Err(MalformedRecord::new("empty path"));
        }
        let frequency = frequency
            .trim()
            .parse::<u64>()
            .map_err(|e| MalformedRecord::new(format!("invalid frequency {frequency:?}: {e}")))?;

        Ok(Self {
            path: path.to_string(),
            frequency,
        })
    }
}
