use generational_arena::{Arena, Index};
use indexmap::IndexMap;
use tracing::instrument;

/// Score payload carried by every trie node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeData {
    /// Frequency recorded when this node terminated an ingested path
    pub own: Option<u64>,
    /// Own frequency before aggregation, subtree sum afterwards
    pub score: u64,
}

/// Trie node in the arena. Children keep their creation order.
#[derive(Debug, Default)]
pub struct TrieNode {
    pub data: NodeData,
    pub children: IndexMap<char, Index>,
}

impl TrieNode {
    pub fn is_terminal(&self) -> bool {
        self.data.own.is_some()
    }
}

/// Arena-backed prefix tree.
///
/// Nodes are never removed, so every `Index` handed out stays valid for the
/// lifetime of the arena. The root exists from construction on and stands for
/// the empty path.
#[derive(Debug)]
pub struct TrieArena {
    arena: Arena<TrieNode>,
    root: Index,
}

impl Default for TrieArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TrieArena {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(TrieNode::default());
        Self { arena, root }
    }

    pub fn root(&self) -> Index {
        self.root
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node(self.root).children.is_empty()
    }

    pub fn get_node(&self, idx: Index) -> Option<&TrieNode> {
        self.arena.get(idx)
    }

    pub(crate) fn node(&self, idx: Index) -> &TrieNode {
        &self.arena[idx]
    }

    pub(crate) fn node_mut(&mut self, idx: Index) -> &mut TrieNode {
        &mut self.arena[idx]
    }

    pub fn child(&self, parent: Index, symbol: char) -> Option<Index> {
        self.arena
            .get(parent)
            .and_then(|node| node.children.get(&symbol).copied())
    }

    /// Returns the child for `symbol`, creating it when missing.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_child(&mut self, parent: Index, symbol: char) -> Index {
        if let Some(existing) = self.child(parent, symbol) {
            return existing;
        }
        let child = self.arena.insert(TrieNode::default());
        self.node_mut(parent).children.insert(symbol, child);
        child
    }

    /// Walks from `start` consuming one symbol per edge.
    pub fn descend(&self, start: Index, path: &str) -> Option<Index> {
        path.chars()
            .try_fold(start, |current, symbol| self.child(current, symbol))
    }

    /// Walks from the root; the empty path resolves to the root itself.
    pub fn find(&self, path: &str) -> Option<Index> {
        self.descend(self.root, path)
    }

    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }
}

/// Pre-order traversal yielding `(index, node, depth)`; the root has depth 0.
pub struct TreeIterator<'a> {
    arena: &'a TrieArena,
    stack: Vec<(Index, usize)>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TrieArena) -> Self {
        Self {
            arena,
            stack: vec![(arena.root(), 0)],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TrieNode, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (current_idx, depth) = self.stack.pop()?;
        let node = self.arena.get_node(current_idx)?;
        // Push children in reverse order for creation-order traversal
        for &child in node.children.values().rev() {
            self.stack.push((child, depth + 1));
        }
        Some((current_idx, node, depth))
    }
}

/// Post-order traversal: every node is yielded after all of its descendants.
pub struct PostOrderIterator<'a> {
    arena: &'a TrieArena,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a TrieArena) -> Self {
        Self {
            arena,
            stack: vec![(arena.root(), false)],
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a TrieNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if visited {
                    return Some((current_idx, node));
                }
                self.stack.push((current_idx, true));
                for &child in node.children.values().rev() {
                    self.stack.push((child, false));
                }
            }
        }
        None
    }
}
