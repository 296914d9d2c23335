//! Bottom-up score aggregation.

use generational_arena::Index;
use tracing::{debug, instrument};

use crate::domain::trie::{RawTrie, ScoredTrie};

impl RawTrie {
    /// Replace every node's score with the sum of its own frequency and the
    /// aggregates of its children.
    ///
    /// Runs as an explicit post-order pass, so tree depth never reaches the
    /// call stack. Consumes the raw tree: aggregating twice is not expressible.
    #[instrument(level = "debug", skip(self), fields(nodes = self.tree.len()))]
    pub fn aggregate(self) -> ScoredTrie {
        let mut tree = self.tree;
        let order: Vec<Index> = tree.iter_postorder().map(|(idx, _)| idx).collect();

        for idx in order {
            let children_sum = tree
                .node(idx)
                .children
                .values()
                .map(|&child| tree.node(child).data.score)
                .fold(0u64, u64::saturating_add);
            let data = &mut tree.node_mut(idx).data;
            data.score = data.own.unwrap_or(0).saturating_add(children_sum);
        }

        let scored = ScoredTrie::from_arena(tree);
        debug!(root_score = scored.root_score(), "aggregation complete");
        scored
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::builder::TrieBuilder;

    #[test]
    fn given_terminal_with_descendants_when_aggregating_then_sums_both() {
        let mut builder = TrieBuilder::new(0);
        builder.ingest("AB", 10).unwrap();
        builder.ingest("ABC", 5).unwrap();
        builder.ingest("ABD", 7).unwrap();

        let trie = builder.finish().aggregate();

        assert_eq!(trie.lookup("ABC").unwrap().score(), 5);
        assert_eq!(trie.lookup("AB").unwrap().score(), 22);
        assert_eq!(trie.lookup("A").unwrap().score(), 22);
        assert_eq!(trie.root_score(), 22);
    }

    #[test]
    fn given_empty_tree_when_aggregating_then_root_score_is_zero() {
        let trie = TrieBuilder::new(0).finish().aggregate();
        assert_eq!(trie.root_score(), 0);
        assert!(trie.is_empty());
    }

    #[test]
    fn given_huge_frequencies_when_aggregating_then_saturates() {
        let mut builder = TrieBuilder::new(0);
        builder.ingest("A", u64::MAX).unwrap();
        builder.ingest("B", 1).unwrap();
        let trie = builder.finish().aggregate();
        assert_eq!(trie.root_score(), u64::MAX);
    }
}
