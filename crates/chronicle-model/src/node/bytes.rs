//! Bytes node: an ordered byte buffer

use crate::action::Action;
use crate::model::push_action;
use crate::node::{type_tag, Node, Payload};
use crate::notification::Notification;

/// Typed facade over a bytes node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytesNode {
    node: Node,
}

impl BytesNode {
    /// Create a free, empty bytes node.
    pub fn new() -> Self {
        Self {
            node: Node::from_payload(type_tag::BYTES, Payload::Bytes(Vec::new())),
        }
    }

    /// Create a free bytes node pre-filled with `data`.
    pub fn with_data(data: &[u8]) -> Self {
        Self {
            node: Node::from_payload(type_tag::BYTES, Payload::Bytes(data.to_vec())),
        }
    }

    pub fn from_node(node: Node) -> Option<Self> {
        node.with_payload(|p| matches!(p, Payload::Bytes(_)))
            .then_some(Self { node })
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn into_node(self) -> Node {
        self.node
    }

    pub fn data(&self) -> Vec<u8> {
        self.node.with_payload(|p| match p {
            Payload::Bytes(data) => data.clone(),
            _ => unreachable!(),
        })
    }

    pub fn len(&self) -> usize {
        self.node.with_payload(|p| match p {
            Payload::Bytes(data) => data.len(),
            _ => unreachable!(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert `bytes` at `index`, `0 <= index <= len`.
    pub fn insert(&self, index: usize, bytes: &[u8]) {
        assert!(self.node.is_writable(), "bytes node is not writable");
        let len = self.len();
        assert!(
            index <= len,
            "bytes insert index {} out of range (len {})",
            index,
            len
        );
        assert!(!bytes.is_empty(), "bytes insert with empty data");

        let action = insert_in_tx(&self.node, index, bytes.to_vec());
        push_action(&self.node, action);
    }

    /// Remove `count` bytes starting at `index`; the range must be fully
    /// inside the buffer and non-empty.
    pub fn remove(&self, index: usize, count: usize) {
        assert!(self.node.is_writable(), "bytes node is not writable");
        let len = self.len();
        assert!(count > 0, "bytes remove with zero count");
        assert!(
            index < len && count <= len - index,
            "bytes remove range {}..{} out of range (len {})",
            index,
            index + count,
            len
        );

        let action = remove_in_tx(&self.node, index, count);
        push_action(&self.node, action);
    }

    /// Overwrite `bytes` at `index`. When the range reaches past the end
    /// of the buffer, the buffer is first extended with zero padding via
    /// an ordinary insert, so the whole call stays reversible.
    pub fn replace(&self, index: usize, bytes: &[u8]) {
        assert!(self.node.is_writable(), "bytes node is not writable");
        let len = self.len();
        assert!(
            index <= len,
            "bytes replace index {} out of range (len {})",
            index,
            len
        );
        if bytes.is_empty() {
            return;
        }

        let end = index + bytes.len();
        if end > len {
            let action = insert_in_tx(&self.node, len, vec![0u8; end - len]);
            push_action(&self.node, action);
        }

        let action = replace_in_tx(&self.node, index, bytes.to_vec());
        push_action(&self.node, action);
    }

    pub fn prepend(&self, bytes: &[u8]) {
        self.insert(0, bytes);
    }

    pub fn append(&self, bytes: &[u8]) {
        self.insert(self.len(), bytes);
    }

    /// Shrink the buffer to `size` bytes. A target at or above the
    /// current length is a no-op.
    pub fn truncate(&self, size: usize) {
        let len = self.len();
        if size < len {
            self.remove(size, len - size);
        }
    }

    pub fn clear(&self) {
        let len = self.len();
        if len > 0 {
            self.remove(0, len);
        }
    }
}

impl Default for BytesNode {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BytesNode> for Node {
    fn from(n: BytesNode) -> Node {
        n.node
    }
}

fn data_mut<'a>(payload: &'a mut Payload) -> &'a mut Vec<u8> {
    match payload {
        Payload::Bytes(data) => data,
        _ => unreachable!("bytes action on a non-bytes node"),
    }
}

/// Apply an insert under the action lock with pre/post notification.
/// Returns the record; the replay path discards it.
pub(crate) fn insert_in_tx(node: &Node, index: usize, bytes: Vec<u8>) -> Action {
    node.begin_action();

    let action = Action::BytesInsert {
        parent: node.clone(),
        index,
        bytes,
    };

    node.notify(&Notification::ActionAboutToTrigger(&action));

    if let Action::BytesInsert { bytes, .. } = &action {
        node.with_payload_mut(|p| {
            let data = data_mut(p);
            let tail = data.split_off(index);
            data.extend_from_slice(bytes);
            data.extend(tail);
        });
    }

    node.notify(&Notification::ActionTriggered(&action));
    node.end_action();
    action
}

pub(crate) fn remove_in_tx(node: &Node, index: usize, count: usize) -> Action {
    node.begin_action();

    let removed = node.with_payload_mut(|p| {
        let data = data_mut(p);
        data[index..index + count].to_vec()
    });
    let action = Action::BytesRemove {
        parent: node.clone(),
        index,
        bytes: removed,
    };

    node.notify(&Notification::ActionAboutToTrigger(&action));

    node.with_payload_mut(|p| {
        data_mut(p).drain(index..index + count);
    });

    node.notify(&Notification::ActionTriggered(&action));
    node.end_action();
    action
}

pub(crate) fn replace_in_tx(node: &Node, index: usize, bytes: Vec<u8>) -> Action {
    node.begin_action();

    let old_bytes = node.with_payload_mut(|p| {
        let data = data_mut(p);
        data[index..index + bytes.len()].to_vec()
    });
    let action = Action::BytesReplace {
        parent: node.clone(),
        index,
        bytes,
        old_bytes,
    };

    node.notify(&Notification::ActionAboutToTrigger(&action));

    if let Action::BytesReplace { bytes, .. } = &action {
        node.with_payload_mut(|p| {
            data_mut(p)[index..index + bytes.len()].copy_from_slice(bytes);
        });
    }

    node.notify(&Notification::ActionTriggered(&action));
    node.end_action();
    action
}
