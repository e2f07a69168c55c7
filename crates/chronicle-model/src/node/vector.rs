//! Vector node: an ordered sequence of child nodes

use crate::action::Action;
use crate::model::push_action;
use crate::node::{type_tag, Node, Payload};
use crate::notification::Notification;

/// Typed facade over a vector node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorNode {
    node: Node,
}

impl VectorNode {
    /// Create a free, empty vector node.
    pub fn new() -> Self {
        Self {
            node: Node::from_payload(type_tag::VECTOR, Payload::Vector(Vec::new())),
        }
    }

    pub fn from_node(node: Node) -> Option<Self> {
        node.with_payload(|p| matches!(p, Payload::Vector(_)))
            .then_some(Self { node })
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn into_node(self) -> Node {
        self.node
    }

    pub fn len(&self) -> usize {
        self.node.with_payload(|p| match p {
            Payload::Vector(children) => children.len(),
            _ => unreachable!(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Node> {
        self.node.with_payload(|p| match p {
            Payload::Vector(children) => children.get(index).cloned(),
            _ => unreachable!(),
        })
    }

    pub fn nodes(&self) -> Vec<Node> {
        self.node.with_payload(|p| match p {
            Payload::Vector(children) => children.clone(),
            _ => unreachable!(),
        })
    }

    /// Insert free nodes at `index`, `0 <= index <= len`.
    pub fn insert(&self, index: usize, nodes: Vec<Node>) {
        assert!(self.node.is_writable(), "vector node is not writable");
        let len = self.len();
        assert!(
            index <= len,
            "vector insert index {} out of range (len {})",
            index,
            len
        );
        assert!(!nodes.is_empty(), "vector insert with no nodes");
        for node in &nodes {
            assert!(node.is_free(), "vector insert of a non-free node");
        }

        let action = insert_in_tx(&self.node, index, nodes);
        push_action(&self.node, action);
    }

    pub fn insert_one(&self, index: usize, node: Node) {
        self.insert(index, vec![node]);
    }

    pub fn prepend(&self, node: Node) {
        self.insert(0, vec![node]);
    }

    pub fn append(&self, node: Node) {
        self.insert(self.len(), vec![node]);
    }

    pub fn append_all(&self, nodes: Vec<Node>) {
        self.insert(self.len(), nodes);
    }

    /// Remove `count` children starting at `index`.
    pub fn remove(&self, index: usize, count: usize) {
        assert!(self.node.is_writable(), "vector node is not writable");
        let len = self.len();
        assert!(count > 0, "vector remove with zero count");
        assert!(
            index < len && count <= len - index,
            "vector remove range {}..{} out of range (len {})",
            index,
            index + count,
            len
        );

        let action = remove_in_tx(&self.node, index, count);
        push_action(&self.node, action);
    }

    pub fn remove_one(&self, index: usize) {
        self.remove(index, 1);
    }

    /// Move `count` children at `index` so the block lands where `dest`
    /// pointed *before* the move. `dest` must not fall inside the moved
    /// range.
    pub fn move_range(&self, index: usize, count: usize, dest: usize) {
        assert!(self.node.is_writable(), "vector node is not writable");
        let len = self.len();
        assert!(count > 0, "vector move with zero count");
        assert!(
            index < len && count <= len - index,
            "vector move range {}..{} out of range (len {})",
            index,
            index + count,
            len
        );
        assert!(
            dest <= len && !(dest >= index && dest < index + count),
            "vector move destination {} overlaps range {}..{}",
            dest,
            index,
            index + count
        );

        let action = move_in_tx(&self.node, index, count, dest);
        push_action(&self.node, action);
    }

    /// Like [`move_range`](VectorNode::move_range), but `dest` is the
    /// index of the block *after* the move.
    pub fn move_range_after(&self, index: usize, count: usize, dest: usize) {
        let dest = if dest <= index { dest } else { dest + count };
        self.move_range(index, count, dest);
    }
}

impl Default for VectorNode {
    fn default() -> Self {
        Self::new()
    }
}

impl From<VectorNode> for Node {
    fn from(n: VectorNode) -> Node {
        n.node
    }
}

fn children_mut<'a>(payload: &'a mut Payload) -> &'a mut Vec<Node> {
    match payload {
        Payload::Vector(children) => children,
        _ => unreachable!("vector action on a non-vector node"),
    }
}

pub(crate) fn insert_in_tx(node: &Node, index: usize, children: Vec<Node>) -> Action {
    node.begin_action();

    let action = Action::VectorInsert {
        parent: node.clone(),
        index,
        children,
    };

    node.notify(&Notification::ActionAboutToTrigger(&action));

    if let Action::VectorInsert { children, .. } = &action {
        for child in children {
            node.add_child(child);
        }
        node.with_payload_mut(|p| {
            let vec = children_mut(p);
            let tail = vec.split_off(index);
            vec.extend(children.iter().cloned());
            vec.extend(tail);
        });
    }

    node.notify(&Notification::ActionTriggered(&action));
    node.end_action();
    action
}

pub(crate) fn remove_in_tx(node: &Node, index: usize, count: usize) -> Action {
    node.begin_action();

    let removed = node.with_payload(|p| match p {
        Payload::Vector(children) => children[index..index + count].to_vec(),
        _ => unreachable!(),
    });
    let action = Action::VectorRemove {
        parent: node.clone(),
        index,
        children: removed,
    };

    node.notify(&Notification::ActionAboutToTrigger(&action));

    if let Action::VectorRemove { children, .. } = &action {
        node.with_payload_mut(|p| {
            children_mut(p).drain(index..index + count);
        });
        for child in children {
            node.remove_child(child);
        }
    }

    node.notify(&Notification::ActionTriggered(&action));
    node.end_action();
    action
}

pub(crate) fn move_in_tx(node: &Node, index: usize, count: usize, dest: usize) -> Action {
    node.begin_action();

    let action = Action::VectorMove {
        parent: node.clone(),
        index,
        count,
        dest,
    };

    node.notify(&Notification::ActionAboutToTrigger(&action));

    node.with_payload_mut(|p| {
        let children = children_mut(p);
        let moved: Vec<Node> = children.drain(index..index + count).collect();
        let at = if dest > index { dest - count } else { dest };
        let tail = children.split_off(at);
        children.extend(moved);
        children.extend(tail);
    });

    node.notify(&Notification::ActionTriggered(&action));
    node.end_action();
    action
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::BytesNode;

    fn tagged(label: &str) -> Node {
        BytesNode::with_data(label.as_bytes()).into_node()
    }

    fn labels(vector: &VectorNode) -> String {
        vector
            .nodes()
            .iter()
            .map(|n| {
                String::from_utf8(n.as_bytes().unwrap().data()).unwrap()
            })
            .collect()
    }

    fn build(labels_str: &str) -> VectorNode {
        let vector = VectorNode::new();
        for c in labels_str.chars() {
            vector.append(tagged(&c.to_string()));
        }
        vector
    }

    #[test]
    fn test_insert_sets_parent() {
        let vector = VectorNode::new();
        let child = tagged("A");
        vector.append(child.clone());
        assert_eq!(child.parent().unwrap(), *vector.node());
        assert_eq!(vector.len(), 1);
        assert!(!child.is_free());
    }

    #[test]
    fn test_move_forward() {
        let vector = build("ABCDE");
        // Move B,C so they land where index 4 (E) was.
        vector.move_range(1, 2, 4);
        assert_eq!(labels(&vector), "ADBCE");
    }

    #[test]
    fn test_move_backward() {
        let vector = build("ABCDE");
        vector.move_range(3, 2, 1);
        assert_eq!(labels(&vector), "ADEBC");
    }

    #[test]
    fn test_move_after_maps_destination() {
        let vector = build("ABCDE");
        // Post-move destination 2 for a block right of it.
        vector.move_range_after(3, 2, 2);
        assert_eq!(labels(&vector), "ABDEC");
    }

    #[test]
    fn test_remove_detaches_nothing_on_free_tree() {
        let vector = build("AB");
        let first = vector.get(0).unwrap();
        vector.remove(0, 1);
        assert_eq!(labels(&vector), "B");
        assert!(first.parent().is_none());
    }

    #[test]
    #[should_panic(expected = "non-free")]
    fn test_insert_attached_node_panics() {
        let vector = build("A");
        let child = vector.get(0).unwrap();
        let other = VectorNode::new();
        other.append(child);
    }

    #[test]
    #[should_panic(expected = "overlaps")]
    fn test_move_dest_inside_range_panics() {
        let vector = build("ABCDE");
        vector.move_range(1, 2, 2);
    }
}
