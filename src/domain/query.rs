//! Read-only queries over an aggregated tree.

use std::cmp::Reverse;

use generational_arena::Index;

use crate::domain::arena::{TrieArena, TrieNode};
use crate::domain::trie::ScoredTrie;

impl ScoredTrie {
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            tree: &self.tree,
            idx: self.tree.root(),
        }
    }

    /// Exact-path lookup. `None` means the path was never ingested (nor is it
    /// a prefix of an ingested path). The empty path yields the root.
    pub fn lookup(&self, path: &str) -> Option<NodeRef<'_>> {
        self.root().lookup(path)
    }

    /// Convenience for `root().ordered_children(limit)`.
    pub fn ordered_children(&self, limit: Option<usize>) -> Vec<char> {
        self.root().ordered_children(limit)
    }
}

/// Read-only handle to a node of a [`ScoredTrie`].
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a TrieArena,
    idx: Index,
}

impl<'a> NodeRef<'a> {
    fn node(&self) -> &'a TrieNode {
        self.tree.node(self.idx)
    }

    /// Aggregate score: own frequency plus everything below.
    pub fn score(&self) -> u64 {
        self.node().data.score
    }

    /// Frequency recorded for exactly this path, if it was a terminal.
    pub fn own_score(&self) -> Option<u64> {
        self.node().data.own
    }

    pub fn is_terminal(&self) -> bool {
        self.node().is_terminal()
    }

    pub fn child_count(&self) -> usize {
        self.node().children.len()
    }

    pub fn child(&self, symbol: char) -> Option<NodeRef<'a>> {
        self.tree.child(self.idx, symbol).map(|idx| NodeRef {
            tree: self.tree,
            idx,
        })
    }

    /// Children in creation order.
    pub fn children(&self) -> impl Iterator<Item = (char, NodeRef<'a>)> + 'a {
        let tree = self.tree;
        self.node()
            .children
            .iter()
            .map(move |(&symbol, &idx)| (symbol, NodeRef { tree, idx }))
    }

    /// Lookup relative to this node.
    pub fn lookup(&self, path: &str) -> Option<NodeRef<'a>> {
        self.tree.descend(self.idx, path).map(|idx| NodeRef {
            tree: self.tree,
            idx,
        })
    }

    /// Child symbols by descending child score.
    pub fn ordered_children(&self, limit: Option<usize>) -> Vec<char> {
        self.ordered_children_scored(limit)
            .into_iter()
            .map(|(symbol, _)| symbol)
            .collect()
    }

    /// `(symbol, score)` pairs by descending score; equal scores keep child
    /// creation order.
    ///
    /// With a limit only the top entries are selected and sorted, the rest is
    /// never put in order.
    pub fn ordered_children_scored(&self, limit: Option<usize>) -> Vec<(char, u64)> {
        let mut entries: Vec<(usize, char, u64)> = self
            .node()
            .children
            .iter()
            .enumerate()
            .map(|(position, (&symbol, &idx))| (position, symbol, self.tree.node(idx).data.score))
            .collect();

        // Creation position makes every key unique, so unstable sorts are stable here.
        let key = |entry: &(usize, char, u64)| (Reverse(entry.2), entry.0);
        match limit {
            Some(0) => return Vec::new(),
            Some(k) if k < entries.len() => {
                entries.select_nth_unstable_by_key(k - 1, key);
                entries.truncate(k);
            }
            _ => {}
        }
        entries.sort_unstable_by_key(key);

        entries
            .into_iter()
            .map(|(_, symbol, score)| (symbol, score))
            .collect()
    }
}
