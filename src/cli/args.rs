//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Scored character trie over n-gram frequency shards
#[derive(Parser, Debug)]
#[command(name = "ngtrie")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Turn debugging information on (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file (default: ./ngtrie.toml when present)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath, env = "NGTRIE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a snapshot from shard files
    Build {
        /// Directory holding the shards
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        input: Option<PathBuf>,
        /// Snapshot file to write
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
        /// Drop records below this frequency
        #[arg(short, long)]
        min_score: Option<u64>,
        /// Overwrite an existing snapshot
        #[arg(short, long)]
        force: bool,
    },

    /// Show snapshot statistics
    Stats {
        /// Snapshot file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        snapshot: Option<PathBuf>,
        /// Number of top-level entries to list
        #[arg(short, long)]
        top: Option<usize>,
    },

    /// Show the best continuations of words
    Query {
        /// Words to look up (default: configured probe words)
        words: Vec<String>,
        /// Snapshot file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        snapshot: Option<PathBuf>,
        /// Continuations per word
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the subtree below a prefix
    Tree {
        /// Prefix (default: whole tree)
        prefix: Option<String>,
        /// Snapshot file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        snapshot: Option<PathBuf>,
        /// Levels to expand
        #[arg(long, default_value_t = 2)]
        depth: usize,
        /// Children shown per node
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Load the snapshot (building it when missing), then report and probe
    Run,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Print a commented config template
    Template,
    /// Show config file locations
    Path,
}
