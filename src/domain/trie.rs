//! Tree lifecycle states.
//!
//! `TrieBuilder` (building) → [`RawTrie`] (built) → [`ScoredTrie`] (aggregated).
//! Every transition consumes the previous state, so a tree cannot be ingested
//! into after it was finished, nor aggregated twice.

use crate::domain::arena::TrieArena;
use crate::domain::builder::BuildReport;

/// A fully ingested tree whose scores are still the raw recorded frequencies.
#[derive(Debug)]
pub struct RawTrie {
    pub(crate) tree: TrieArena,
    pub(crate) report: BuildReport,
}

impl RawTrie {
    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.tree.len()
    }

    /// Frequency recorded for exactly this path, if it was ingested.
    pub fn own_score(&self, path: &str) -> Option<u64> {
        self.tree
            .find(path)
            .and_then(|idx| self.tree.node(idx).data.own)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.tree.find(path).is_some()
    }
}

/// An aggregated, read-only tree: every score is the sum of its subtree.
#[derive(Debug)]
pub struct ScoredTrie {
    pub(crate) tree: TrieArena,
}

impl ScoredTrie {
    pub(crate) fn from_arena(tree: TrieArena) -> Self {
        Self { tree }
    }

    /// Aggregate score of the root: the sum of all recorded frequencies.
    pub fn root_score(&self) -> u64 {
        self.tree.node(self.tree.root()).data.score
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

/// Structural and numeric equality: same symbols, same child order, same
/// scores and own markers at every node.
impl PartialEq for ScoredTrie {
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(self.tree.root(), other.tree.root())];
        while let Some((left, right)) = stack.pop() {
            let (left, right) = (self.tree.node(left), other.tree.node(right));
            if left.data != right.data || left.children.len() != right.children.len() {
                return false;
            }
            for ((ls, &li), (rs, &ri)) in left.children.iter().zip(right.children.iter()) {
                if ls != rs {
                    return false;
                }
                stack.push((li, ri));
            }
        }
        true
    }
}

impl Eq for ScoredTrie {}
