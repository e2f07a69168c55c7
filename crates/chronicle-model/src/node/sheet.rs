//! Sheet node: stable-id child container with monotonic id assignment

use std::collections::BTreeMap;

use crate::action::Action;
use crate::model::push_action;
use crate::node::{type_tag, Node, Payload, SheetData};
use crate::notification::Notification;

/// Typed facade over a sheet node.
///
/// Children are keyed by a positive id assigned at insertion. Ids are
/// never reused: the high-water mark only advances, and undoing an
/// insert keeps the mark where it was so redo restores the same id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetNode {
    node: Node,
}

impl SheetNode {
    /// Create a free, empty sheet node.
    pub fn new() -> Self {
        Self {
            node: Node::from_payload(
                type_tag::SHEET,
                Payload::Sheet(SheetData {
                    entries: BTreeMap::new(),
                    max_id: 0,
                }),
            ),
        }
    }

    pub fn from_node(node: Node) -> Option<Self> {
        node.with_payload(|p| matches!(p, Payload::Sheet(_)))
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
            Payload::Sheet(sheet) => sheet.entries.len(),
            _ => unreachable!(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: u32) -> Option<Node> {
        self.node.with_payload(|p| match p {
            Payload::Sheet(sheet) => sheet.entries.get(&id).cloned(),
            _ => unreachable!(),
        })
    }

    pub fn ids(&self) -> Vec<u32> {
        self.node.with_payload(|p| match p {
            Payload::Sheet(sheet) => sheet.entries.keys().copied().collect(),
            _ => unreachable!(),
        })
    }

    pub fn entries(&self) -> Vec<(u32, Node)> {
        self.node.with_payload(|p| match p {
            Payload::Sheet(sheet) => sheet
                .entries
                .iter()
                .map(|(id, n)| (*id, n.clone()))
                .collect(),
            _ => unreachable!(),
        })
    }

    /// Highest id ever assigned by this sheet.
    pub fn max_id(&self) -> u32 {
        self.node.with_payload(|p| match p {
            Payload::Sheet(sheet) => sheet.max_id,
            _ => unreachable!(),
        })
    }

    /// Insert a free node and return its freshly assigned id.
    pub fn insert(&self, child: Node) -> u32 {
        assert!(self.node.is_writable(), "sheet node is not writable");
        assert!(child.is_free(), "sheet insert of a non-free node");

        let id = self.max_id() + 1;
        let action = insert_in_tx(&self.node, id, child);
        push_action(&self.node, action);
        id
    }

    /// Remove the child at `id`. Returns `false` when the id is absent.
    pub fn remove(&self, id: u32) -> bool {
        assert!(self.node.is_writable(), "sheet node is not writable");

        if self.get(id).is_none() {
            return false;
        }
        let action = remove_in_tx(&self.node, id);
        push_action(&self.node, action);
        true
    }
}

impl Default for SheetNode {
    fn default() -> Self {
        Self::new()
    }
}

impl From<SheetNode> for Node {
    fn from(n: SheetNode) -> Node {
        n.node
    }
}

fn sheet_mut<'a>(payload: &'a mut Payload) -> &'a mut SheetData {
    match payload {
        Payload::Sheet(sheet) => sheet,
        _ => unreachable!("sheet action on a non-sheet node"),
    }
}

/// Apply an insert at a fixed id. The high-water mark only ratchets
/// upward, so replaying an old insert never disturbs later ids.
pub(crate) fn insert_in_tx(node: &Node, id: u32, child: Node) -> Action {
    node.begin_action();

    let action = Action::SheetInsert {
        parent: node.clone(),
        id,
        child,
    };

    node.notify(&Notification::ActionAboutToTrigger(&action));

    if let Action::SheetInsert { id, child, .. } = &action {
        node.add_child(child);
        node.with_payload_mut(|p| {
            let sheet = sheet_mut(p);
            sheet.entries.insert(*id, child.clone());
            sheet.max_id = sheet.max_id.max(*id);
        });
    }

    node.notify(&Notification::ActionTriggered(&action));
    node.end_action();
    action
}

pub(crate) fn remove_in_tx(node: &Node, id: u32) -> Action {
    node.begin_action();

    let child = node.with_payload(|p| match p {
        Payload::Sheet(sheet) => sheet
            .entries
            .get(&id)
            .cloned()
            .expect("sheet remove of an absent id"),
        _ => unreachable!(),
    });
    let action = Action::SheetRemove {
        parent: node.clone(),
        id,
        child,
    };

    node.notify(&Notification::ActionAboutToTrigger(&action));

    if let Action::SheetRemove { id, child, .. } = &action {
        node.with_payload_mut(|p| {
            sheet_mut(p).entries.remove(id);
        });
        node.remove_child(child);
    }

    node.notify(&Notification::ActionTriggered(&action));
    node.end_action();
    action
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::BytesNode;

    #[test]
    fn test_ids_are_monotonic() {
        let sheet = SheetNode::new();
        let a = sheet.insert(BytesNode::new().into_node());
        let b = sheet.insert(BytesNode::new().into_node());
        let c = sheet.insert(BytesNode::new().into_node());
        assert_eq!((a, b, c), (1, 2, 3));
        assert_eq!(sheet.max_id(), 3);
    }

    #[test]
    fn test_removed_ids_are_never_reused() {
        let sheet = SheetNode::new();
        sheet.insert(BytesNode::new().into_node());
        let b = sheet.insert(BytesNode::new().into_node());
        sheet.insert(BytesNode::new().into_node());

        assert!(sheet.remove(b));
        let d = sheet.insert(BytesNode::new().into_node());
        assert_eq!(d, 4);
        assert_eq!(sheet.ids(), vec![1, 3, 4]);
    }

    #[test]
    fn test_remove_absent_id() {
        let sheet = SheetNode::new();
        assert!(!sheet.remove(7));
    }

    #[test]
    fn test_insert_sets_parent() {
        let sheet = SheetNode::new();
        let child = BytesNode::new().into_node();
        let id = sheet.insert(child.clone());
        assert_eq!(child.parent().unwrap(), *sheet.node());
        assert_eq!(sheet.get(id).unwrap(), child);
    }
}
