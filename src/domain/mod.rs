//! Domain layer: the scored prefix tree and its codec
//!
//! This layer is independent of external concerns (no filesystem, no CLI, no config loading).
//! Sources and snapshots are plain `Read`/`Write`/`BufRead` streams here.

pub mod aggregate;
pub mod arena;
pub mod builder;
pub mod error;
pub mod query;
pub mod record;
pub mod snapshot;
pub mod stats;
pub mod trie;

pub use arena::{NodeData, TrieArena, TrieNode};
pub use builder::{build, build_with, BuildReport, Ingested, ShardSource, TrieBuilder};
pub use error::{DomainError, TreeResult};
pub use query::NodeRef;
pub use record::{MalformedRecord, Record};
pub use snapshot::{SNAPSHOT_MAGIC, SNAPSHOT_VERSION};
pub use stats::TreeStats;
pub use trie::{RawTrie, ScoredTrie};
