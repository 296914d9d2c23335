//! Terminal rendering of subtrees.

use termtree::Tree;

use crate::domain::NodeRef;

/// Render `node` and its best children as a `termtree`.
///
/// Children are listed by descending score, at most `limit` per node and
/// `depth` levels deep.
pub fn to_tree_string(label: &str, node: NodeRef<'_>, depth: usize, limit: Option<usize>) -> Tree<String> {
    let mut tree = Tree::new(format!("{} ({})", label, node.score()));
    if depth == 0 {
        return tree;
    }
    for (symbol, _) in node.ordered_children_scored(limit) {
        if let Some(child) = node.child(symbol) {
            tree.push(to_tree_string(&symbol.to_string(), child, depth - 1, limit));
        }
    }
    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TrieBuilder;

    #[test]
    fn given_depth_and_limit_when_rendering_then_prunes_by_score() {
        let mut builder = TrieBuilder::new(0);
        builder.ingest("AB", 10).unwrap();
        builder.ingest("AC", 30).unwrap();
        builder.ingest("AD", 20).unwrap();
        builder.ingest("ACE", 5).unwrap();
        let trie = builder.finish().aggregate();

        let rendered = to_tree_string("A", trie.lookup("A").unwrap(), 1, Some(2)).to_string();

        assert!(rendered.starts_with("A (65)"));
        assert!(rendered.contains("C (35)"));
        assert!(rendered.contains("D (20)"));
        assert!(!rendered.contains("B (10)"));
        assert!(!rendered.contains("E (5)"));
    }
}
