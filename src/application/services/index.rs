//! Index service
//!
//! Discovers shard files, builds and aggregates the trie, and moves snapshots
//! between memory and disk.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{build_with, BuildReport, RawTrie, ScoredTrie};
use crate::infrastructure::traits::FileSystem;

/// Inputs of a build run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Directory holding the shard files
    pub input_dir: PathBuf,
    /// Where the snapshot is written
    pub snapshot: PathBuf,
    /// Records below this frequency are dropped
    pub min_score: u64,
    /// Overwrite an existing snapshot
    pub force: bool,
}

impl BuildOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            input_dir: settings.input_dir.clone(),
            snapshot: settings.snapshot.clone(),
            min_score: settings.min_score,
            force: false,
        }
    }
}

/// Result of a completed build.
#[derive(Debug)]
pub struct BuildOutcome {
    pub report: BuildReport,
    pub root_score: u64,
    pub snapshot: PathBuf,
    pub trie: ScoredTrie,
}

/// How [`IndexService::open_or_build`] obtained its tree.
#[derive(Debug)]
pub enum Opened {
    Loaded(ScoredTrie),
    Built(BuildOutcome),
}

impl Opened {
    pub fn trie(&self) -> &ScoredTrie {
        match self {
            Opened::Loaded(trie) => trie,
            Opened::Built(outcome) => &outcome.trie,
        }
    }

    pub fn into_trie(self) -> ScoredTrie {
        match self {
            Opened::Loaded(trie) => trie,
            Opened::Built(outcome) => outcome.trie,
        }
    }
}

/// Service for building, saving and loading tries.
pub struct IndexService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl IndexService {
    /// Create a new index service.
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Shard files in `dir`, sorted by name.
    ///
    /// A shard is a regular file whose name starts with the configured prefix
    /// and carries the configured extension.
    #[instrument(level = "debug", skip(self))]
    pub fn discover_shards(&self, dir: &Path) -> ApplicationResult<Vec<PathBuf>> {
        if !self.fs.is_dir(dir) {
            return Err(ApplicationError::InputDirNotFound(dir.to_path_buf()));
        }
        let prefix = &self.settings.shard_prefix;
        let extension = &self.settings.shard_extension;

        let mut shards: Vec<PathBuf> = self
            .fs
            .list_files(dir)
            .with_path_context("list shards", dir)?
            .into_iter()
            .filter(|path| {
                let name_matches = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(prefix.as_str()));
                let ext_matches = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext == extension);
                name_matches && ext_matches
            })
            .collect();
        shards.sort();

        if shards.is_empty() {
            return Err(ApplicationError::NoShards {
                dir: dir.to_path_buf(),
                prefix: prefix.clone(),
                extension: extension.clone(),
            });
        }
        debug!("discover_shards: found {} shards", shards.len());
        Ok(shards)
    }

    /// Ingest every shard in `dir` into a fresh tree.
    ///
    /// Shards are opened one at a time as the build reaches them.
    #[instrument(level = "debug", skip(self))]
    pub fn build(&self, dir: &Path, min_score: u64) -> ApplicationResult<RawTrie> {
        let names: Vec<String> = self
            .discover_shards(dir)?
            .iter()
            .filter_map(|shard| shard.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        info!("building trie from {} shards, min_score {}", names.len(), min_score);

        build_with(names, min_score, |name| {
            let shard = dir.join(name);
            self.fs
                .open_read(&shard)
                .with_path_context("open shard", &shard)
        })
    }

    /// Write `trie` to `path` through a sibling temporary file.
    #[instrument(level = "debug", skip(self, trie))]
    pub fn save(&self, trie: &ScoredTrie, path: &Path) -> ApplicationResult<()> {
        self.fs
            .ensure_parent(path)
            .with_path_context("create snapshot directory", path)?;

        let tmp = tmp_path(path);
        let writer = self
            .fs
            .create_write(&tmp)
            .with_path_context("create snapshot", &tmp)?;
        if let Err(e) = trie.write_to(writer) {
            if let Err(cleanup) = self.fs.remove_file(&tmp) {
                warn!("cannot remove {}: {}", tmp.display(), cleanup);
            }
            return Err(e.into());
        }
        if let Err(e) = self.fs.rename(&tmp, path) {
            if let Err(cleanup) = self.fs.remove_file(&tmp) {
                warn!("cannot remove {}: {}", tmp.display(), cleanup);
            }
            return Err(e).with_path_context("move snapshot into place", path);
        }

        info!("snapshot saved to {}", path.display());
        Ok(())
    }

    /// Read a snapshot written by [`IndexService::save`].
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<ScoredTrie> {
        if !self.fs.exists(path) {
            return Err(ApplicationError::SnapshotNotFound(path.to_path_buf()));
        }
        let reader = self
            .fs
            .open_read(path)
            .with_path_context("open snapshot", path)?;
        let trie = ScoredTrie::read_from(reader)?;
        info!(
            "snapshot loaded from {}: root score {}",
            path.display(),
            trie.root_score()
        );
        Ok(trie)
    }

    /// Build, aggregate and save in one go.
    ///
    /// Refuses to replace an existing snapshot unless `force` is set.
    #[instrument(level = "debug", skip(self))]
    pub fn build_and_save(&self, options: &BuildOptions) -> ApplicationResult<BuildOutcome> {
        if !options.force && self.fs.exists(&options.snapshot) {
            return Err(ApplicationError::SnapshotExists(options.snapshot.clone()));
        }

        let raw = self.build(&options.input_dir, options.min_score)?;
        let report = *raw.report();
        let trie = raw.aggregate();
        let root_score = trie.root_score();
        info!("root score: {}", root_score);

        self.save(&trie, &options.snapshot)?;
        Ok(BuildOutcome {
            report,
            root_score,
            snapshot: options.snapshot.clone(),
            trie,
        })
    }

    /// Load the configured snapshot, or build and save it when missing.
    #[instrument(level = "debug", skip(self))]
    pub fn open_or_build(&self) -> ApplicationResult<Opened> {
        let snapshot = &self.settings.snapshot;
        if self.fs.exists(snapshot) {
            info!("snapshot exists, loading {}", snapshot.display());
            return self.load(snapshot).map(Opened::Loaded);
        }
        info!("no snapshot at {}, building", snapshot.display());
        self.build_and_save(&BuildOptions::from_settings(&self.settings))
            .map(Opened::Built)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp: OsString = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_snapshot_path_when_deriving_tmp_then_appends_suffix() {
        assert_eq!(
            tmp_path(Path::new("out/trigram_tree.bin")),
            PathBuf::from("out/trigram_tree.bin.tmp")
        );
    }
}
