//! ngtrie: a scored character trie over n-gram frequency shards.
//!
//! Records `(path, frequency)` are ingested into a prefix tree keyed by
//! Unicode scalar values, every node is then scored with the sum of the
//! frequencies in its subtree, and the result can be stored as a binary
//! snapshot and queried for the best continuations of a prefix.
//!
//! ```no_run
//! use std::io::Cursor;
//! use ngtrie::{build, ShardSource};
//!
//! let shard = ShardSource::new("output_000.txt", Cursor::new("你好\t120\n你們\t300\n"));
//! let trie = build([shard], 100)?.aggregate();
//! assert_eq!(trie.lookup("你").map(|n| n.score()), Some(420));
//! ngtrie::save(&trie, "trigram_tree.bin".as_ref())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::Path;
use std::sync::Arc;

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use application::{ApplicationError, ApplicationResult};
pub use config::Settings;
pub use domain::{
    build, build_with, BuildReport, DomainError, Ingested, NodeRef, RawTrie, ScoredTrie, ShardSource,
    TreeResult, TreeStats, TrieBuilder,
};

use application::services::IndexService;
use infrastructure::traits::RealFileSystem;

fn default_service() -> IndexService {
    IndexService::new(Arc::new(RealFileSystem), Arc::new(Settings::default()))
}

/// Write `trie` as a snapshot at `path`, replacing any existing file.
pub fn save(trie: &ScoredTrie, path: &Path) -> ApplicationResult<()> {
    default_service().save(trie, path)
}

/// Read a snapshot written by [`save`].
pub fn load(path: &Path) -> ApplicationResult<ScoredTrie> {
    default_service().load(path)
}
