//! Trie builder: ingests frequency records from shard sources.

use std::io::BufRead;

use tracing::{debug, info, instrument, warn};

use crate::domain::arena::TrieArena;
use crate::domain::error::{DomainError, TreeResult};
use crate::domain::record::Record;
use crate::domain::trie::RawTrie;

/// Log build progress every this many sources.
const PROGRESS_EVERY: usize = 20;

/// Counters collected while ingesting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Sources fully consumed
    pub sources: usize,
    /// Non-blank lines seen
    pub records: usize,
    /// Records inserted into the tree
    pub accepted: usize,
    /// Records dropped by the minimum score
    pub filtered: usize,
    /// Lines skipped as malformed
    pub malformed: usize,
}

/// Outcome of a single ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    Inserted,
    Filtered,
}

/// A named record source, e.g. one shard file.
pub struct ShardSource<R> {
    pub name: String,
    pub reader: R,
}

impl<R> ShardSource<R> {
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            reader,
        }
    }
}

/// Materializes a prefix tree from `(path, frequency)` records.
#[derive(Debug)]
pub struct TrieBuilder {
    tree: TrieArena,
    min_score: u64,
    report: BuildReport,
}

impl TrieBuilder {
    pub fn new(min_score: u64) -> Self {
        Self {
            tree: TrieArena::new(),
            min_score,
            report: BuildReport::default(),
        }
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    /// Insert one path, creating missing nodes edge by edge.
    ///
    /// Records below the minimum score are dropped. Ingesting the same path
    /// again overwrites its frequency.
    pub fn ingest(&mut self, path: &str, frequency: u64) -> TreeResult<Ingested> {
        if path.is_empty() {
            return Err(DomainError::EmptyPath);
        }
        if frequency < self.min_score {
            self.report.filtered += 1;
            return Ok(Ingested::Filtered);
        }

        let terminal = path
            .chars()
            .fold(self.tree.root(), |current, symbol| {
                self.tree.insert_child(current, symbol)
            });
        let data = &mut self.tree.node_mut(terminal).data;
        data.own = Some(frequency);
        data.score = frequency;

        self.report.accepted += 1;
        Ok(Ingested::Inserted)
    }

    /// Consume every line of `reader`.
    ///
    /// Malformed lines, blank ones included, are logged and skipped; only
    /// read failures abort.
    #[instrument(level = "debug", skip(self, reader))]
    pub fn ingest_source<R: BufRead>(&mut self, name: &str, mut reader: R) -> TreeResult<()> {
        let mut buf = Vec::new();
        let mut line_no = 0usize;

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source| DomainError::SourceRead {
                    name: name.to_string(),
                    source,
                })?;
            if read == 0 {
                break;
            }
            line_no += 1;

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line,
                Err(e) => {
                    self.report.records += 1;
                    self.report.malformed += 1;
                    warn!(source = name, line = line_no, "skipping line with invalid UTF-8: {e}");
                    continue;
                }
            };
            self.report.records += 1;
            match Record::parse(line) {
                Ok(record) => {
                    self.ingest(&record.path, record.frequency)?;
                }
                Err(e) => {
                    self.report.malformed += 1;
                    warn!(
                        source = name,
                        line = line_no,
                        "skipping malformed record {:?}: {e}",
                        line.trim()
                    );
                }
            }
        }

        self.report.sources += 1;
        debug!(source = name, lines = line_no, "source consumed");
        Ok(())
    }

    /// Frequency currently recorded for exactly this path.
    pub fn own_score(&self, path: &str) -> Option<u64> {
        self.tree
            .find(path)
            .and_then(|idx| self.tree.node(idx).data.own)
    }

    /// Close the building phase.
    pub fn finish(self) -> RawTrie {
        let report = self.report;
        info!(
            sources = report.sources,
            records = report.records,
            accepted = report.accepted,
            filtered = report.filtered,
            malformed = report.malformed,
            nodes = self.tree.len(),
            "trie built"
        );
        RawTrie {
            tree: self.tree,
            report,
        }
    }
}

/// Build a tree from several sources.
///
/// Sources are consumed in lexicographic order of their names so that
/// last-write-wins overwrites are reproducible.
pub fn build<R, I>(sources: I, min_score: u64) -> TreeResult<RawTrie>
where
    R: BufRead,
    I: IntoIterator<Item = ShardSource<R>>,
{
    let mut sources: Vec<ShardSource<R>> = sources.into_iter().collect();
    sources.sort_by(|a, b| a.name.cmp(&b.name));
    ingest_in_order(sources.len(), sources.into_iter().map(Ok), min_score)
}

/// Build from named sources that are opened one at a time by `open`.
///
/// Names are consumed in lexicographic order, like [`build`]. Errors from
/// `open` abort the build.
pub fn build_with<R, E, F>(mut names: Vec<String>, min_score: u64, mut open: F) -> Result<RawTrie, E>
where
    R: BufRead,
    E: From<DomainError>,
    F: FnMut(&str) -> Result<R, E>,
{
    names.sort();
    let total = names.len();
    let sources = names
        .into_iter()
        .map(|name| open(&name).map(move |reader| ShardSource::new(name, reader)));
    ingest_in_order(total, sources, min_score)
}

fn ingest_in_order<R, E, I>(total: usize, sources: I, min_score: u64) -> Result<RawTrie, E>
where
    R: BufRead,
    E: From<DomainError>,
    I: IntoIterator<Item = Result<ShardSource<R>, E>>,
{
    let mut builder = TrieBuilder::new(min_score);
    for (n, source) in sources.into_iter().enumerate() {
        let source = source?;
        if (n + 1) % PROGRESS_EVERY == 0 {
            info!("processing source {}/{}: {}", n + 1, total, source.name);
        }
        builder.ingest_source(&source.name, source.reader)?;
    }
    Ok(builder.finish())
}
