//! Per-model id index

use std::collections::HashMap;

use crate::node::{Node, WeakNode};

/// Map from stable id to live node, plus the monotonic id allocator.
///
/// Entries are weak: the index never keeps a node alive. Nodes
/// unregister themselves when dropped, except while the model is
/// clearing, in which case the whole map is thrown away at the end.
pub(crate) struct IdIndex {
    map: HashMap<u64, WeakNode>,
    max_id: u64,
}

impl IdIndex {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            max_id: 0,
        }
    }

    /// Register `node`. A positive `id` comes from deserialized state and
    /// is kept as-is; zero means "assign the next id". Returns the final
    /// id.
    pub fn add(&mut self, node: &Node, id: u64) -> u64 {
        let id = if id > 0 {
            self.max_id = self.max_id.max(id);
            id
        } else {
            self.max_id += 1;
            self.max_id
        };
        self.map.insert(id, node.downgrade());
        id
    }

    pub fn remove(&mut self, id: u64) {
        self.map.remove(&id);
    }

    pub fn get(&self, id: u64) -> Option<Node> {
        self.map.get(&id).and_then(WeakNode::upgrade)
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.max_id = 0;
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::BytesNode;

    #[test]
    fn test_fresh_ids_count_up() {
        let mut index = IdIndex::new();
        let a = BytesNode::new().into_node();
        let b = BytesNode::new().into_node();
        assert_eq!(index.add(&a, 0), 1);
        assert_eq!(index.add(&b, 0), 2);
        assert_eq!(index.get(1).unwrap(), a);
        assert_eq!(index.get(2).unwrap(), b);
    }

    #[test]
    fn test_preserved_ids_advance_the_allocator() {
        let mut index = IdIndex::new();
        let a = BytesNode::new().into_node();
        let b = BytesNode::new().into_node();
        assert_eq!(index.add(&a, 7), 7);
        assert_eq!(index.add(&b, 0), 8);
    }

    #[test]
    fn test_removed_ids_resolve_to_nothing() {
        let mut index = IdIndex::new();
        let a = BytesNode::new().into_node();
        let id = index.add(&a, 0);
        index.remove(id);
        assert!(index.get(id).is_none());
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn test_entries_are_weak() {
        let mut index = IdIndex::new();
        let id = {
            let a = BytesNode::new().into_node();
            index.add(&a, 0)
        };
        // The node is gone; the stale entry resolves to nothing.
        assert!(index.get(id).is_none());
    }

    #[test]
    fn test_clear_resets_the_allocator() {
        let mut index = IdIndex::new();
        let a = BytesNode::new().into_node();
        index.add(&a, 5);
        index.clear();
        assert_eq!(index.add(&a, 0), 1);
    }
}
