//! Arena-allocated search tree.
//!
//! Nodes are stored in a contiguous vector and referenced by index. The
//! tree is owned by exactly one search engine; a fresh root is created per
//! search call (no tree reuse across real moves).

use crate::node::{Node, NodeId};
use std::hash::Hash;

#[derive(Debug)]
pub struct Tree<A: Clone + Copy + Eq + Hash> {
    nodes: Vec<Node<A>>,
}

impl<A: Clone + Copy + Eq + Hash> Tree<A> {
    /// A tree holding only an unexpanded root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::root()],
        }
    }

    /// # Panics
    /// Panics if the id does not belong to this tree.
    pub fn get(&self, id: NodeId) -> &Node<A> {
        &self.nodes[id.index()]
    }

    /// # Panics
    /// Panics if the id does not belong to this tree.
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node<A> {
        &mut self.nodes[id.index()]
    }

    /// Adds a node, returning its id.
    pub fn add(&mut self, node: Node<A>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Discards all nodes and re-seeds a fresh root.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(Node::root());
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> &Node<A> {
        self.get(NodeId::ROOT)
    }

    pub fn root_mut(&mut self) -> &mut Node<A> {
        self.get_mut(NodeId::ROOT)
    }

    /// Iterates over all nodes, root first.
    pub fn iter(&self) -> impl Iterator<Item = &Node<A>> {
        self.nodes.iter()
    }
}

impl<A: Clone + Copy + Eq + Hash> Default for Tree<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tree_holds_root_only() {
        let tree: Tree<u8> = Tree::new();
        assert_eq!(tree.len(), 1);
        assert!(!tree.is_empty());
        assert!(!tree.root().expanded);
    }

    #[test]
    fn add_returns_sequential_ids() {
        let mut tree: Tree<u8> = Tree::new();
        let a = tree.add(Node::new(Some(1), 0.5, -1));
        let b = tree.add(Node::new(Some(2), 0.5, -1));
        assert_eq!(a.index(), 1);
        assert_eq!(b.index(), 2);
        assert_eq!(tree.get(b).action, Some(2));
    }

    #[test]
    fn clear_reseeds_fresh_root() {
        let mut tree: Tree<u8> = Tree::new();
        tree.root_mut().expanded = true;
        tree.add(Node::new(Some(1), 0.5, -1));
        tree.clear();
        assert_eq!(tree.len(), 1);
        assert!(!tree.root().expanded);
    }
}
