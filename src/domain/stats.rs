//! Tree statistics gathered in a single traversal.

use itertools::Itertools;

use crate::domain::trie::ScoredTrie;

/// Summary of an aggregated tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// All nodes, root included
    pub total_nodes: usize,
    /// Longest root-to-node edge count
    pub max_depth: usize,
    /// Distinct symbols used on any edge
    pub unique_symbols: usize,
    /// Nodes carrying an own recorded frequency
    pub terminal_nodes: usize,
    pub root_score: u64,
}

impl ScoredTrie {
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            root_score: self.root_score(),
            ..TreeStats::default()
        };
        for (_, node, depth) in self.tree.iter() {
            stats.total_nodes += 1;
            stats.max_depth = stats.max_depth.max(depth);
            if node.is_terminal() {
                stats.terminal_nodes += 1;
            }
        }
        stats.unique_symbols = self
            .tree
            .iter()
            .flat_map(|(_, node, _)| node.children.keys().copied())
            .unique()
            .count();
        stats
    }

    /// The `n` highest scored first-level symbols.
    pub fn top_level(&self, n: usize) -> Vec<(char, u64)> {
        self.root().ordered_children_scored(Some(n))
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::builder::TrieBuilder;

    #[test]
    fn given_tree_when_collecting_stats_then_counts_nodes_depth_and_symbols() {
        let mut builder = TrieBuilder::new(0);
        builder.ingest("天氣好", 10).unwrap();
        builder.ingest("天氣", 4).unwrap();
        builder.ingest("好天", 6).unwrap();
        let trie = builder.finish().aggregate();

        let stats = trie.stats();

        // root, 天, 氣, 好(under 氣), 好, 天(under 好)
        assert_eq!(stats.total_nodes, 6);
        assert_eq!(stats.max_depth, 3);
        assert_eq!(stats.unique_symbols, 3);
        assert_eq!(stats.terminal_nodes, 3);
        assert_eq!(stats.root_score, 20);
        assert_eq!(trie.top_level(1), vec![('天', 14)]);
    }

    #[test]
    fn given_empty_tree_when_collecting_stats_then_only_root_counts() {
        let trie = TrieBuilder::new(0).finish().aggregate();
        let stats = trie.stats();
        assert_eq!(stats.total_nodes, 1);
        assert_eq!(stats.max_depth, 0);
        assert_eq!(stats.unique_symbols, 0);
    }
}
