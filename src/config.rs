//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/ngtrie/ngtrie.toml`
//! 3. Local config: `./ngtrie.toml`, or the file given with `--config`
//! 4. Environment variables: `NGTRIE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// File name of the local config in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "ngtrie.toml";

/// Unified configuration for ngtrie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the shard files
    pub input_dir: PathBuf,
    /// Shard file name prefix
    pub shard_prefix: String,
    /// Shard file extension, without the dot
    pub shard_extension: String,
    /// Snapshot file
    pub snapshot: PathBuf,
    /// Records below this frequency are not ingested
    pub min_score: u64,
    /// Entries shown in top-N listings
    pub top_k: usize,
    /// Words probed by `run` and by `query` without arguments
    pub probe_words: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("trigram_output"),
            shard_prefix: "output_".into(),
            shard_extension: "txt".into(),
            snapshot: PathBuf::from("trigram_tree.bin"),
            min_score: 100,
            top_k: 10,
            probe_words: ["男", "女", "你", "你好", "我是", "天氣", "臺灣", "程式", "設計"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub input_dir: Option<PathBuf>,
    pub shard_prefix: Option<String>,
    pub shard_extension: Option<String>,
    pub snapshot: Option<PathBuf>,
    pub min_score: Option<u64>,
    pub top_k: Option<usize>,
    pub probe_words: Option<Vec<String>>,
}

/// Get the XDG config directory for ngtrie.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "ngtrie").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("ngtrie.toml"))
}

/// Expand `~`, `$VAR` and `${VAR}` in a path string.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand shell variables and tilde in path fields.
    fn expand_paths(&mut self) {
        self.input_dir = expand_path(&self.input_dir);
        self.snapshot = expand_path(&self.snapshot);
    }

    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            input_dir: overlay
                .input_dir
                .clone()
                .unwrap_or_else(|| self.input_dir.clone()),
            shard_prefix: overlay
                .shard_prefix
                .clone()
                .unwrap_or_else(|| self.shard_prefix.clone()),
            shard_extension: overlay
                .shard_extension
                .clone()
                .unwrap_or_else(|| self.shard_extension.clone()),
            snapshot: overlay
                .snapshot
                .clone()
                .unwrap_or_else(|| self.snapshot.clone()),
            min_score: overlay.min_score.unwrap_or(self.min_score),
            top_k: overlay.top_k.unwrap_or(self.top_k),
            probe_words: overlay
                .probe_words
                .clone()
                .unwrap_or_else(|| self.probe_words.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local` - Explicit config file. When `None`, `./ngtrie.toml` is used
    ///   if it exists. An explicit file must exist.
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/ngtrie/ngtrie.toml`
    /// 3. Local config
    /// 4. Environment variables: `NGTRIE_*` prefix
    pub fn load(local: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        match local {
            Some(path) => {
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
            }
            None => {
                let path = Path::new(LOCAL_CONFIG_FILE);
                if path.exists() {
                    let raw = load_raw_settings(path)?;
                    current = current.merge_with(&raw);
                }
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply NGTRIE_* environment variables as explicit overrides.
    fn apply_env_overrides(settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("NGTRIE")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("probe_words"),
            )
            .build()
            .map_err(config_err)?;

        let raw = RawSettings {
            input_dir: optional(config.get_string("input_dir"))?.map(PathBuf::from),
            shard_prefix: optional(config.get_string("shard_prefix"))?,
            shard_extension: optional(config.get_string("shard_extension"))?,
            snapshot: optional(config.get_string("snapshot"))?.map(PathBuf::from),
            min_score: optional(config.get::<u64>("min_score"))?,
            top_k: optional(config.get::<usize>("top_k"))?,
            probe_words: optional(config.get::<Vec<String>>("probe_words"))?,
        };
        Ok(settings.merge_with(&raw))
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# ngtrie configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/ngtrie/ngtrie.toml
#   Local:  ./ngtrie.toml (or --config <file>)
#   Env:    NGTRIE_* environment variables, e.g. NGTRIE_MIN_SCORE=50

# Directory holding the shard files
# input_dir = "trigram_output"

# Shard files are <shard_prefix>*.<shard_extension>
# shard_prefix = "output_"
# shard_extension = "txt"

# Snapshot written by `build` and read by the query commands
# snapshot = "trigram_tree.bin"

# Records below this frequency are dropped while building
# min_score = 100

# Entries shown in top-N listings
# top_k = 10

# Words probed by `run` (NGTRIE_PROBE_WORDS takes a comma separated list)
# probe_words = ["你", "你好", "天氣"]
"#
        .to_string()
    }
}

/// Missing keys are `None`; any other lookup failure is an error.
fn optional<T>(result: Result<T, ConfigError>) -> Result<Option<T>, ApplicationError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(config_err(e)),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
