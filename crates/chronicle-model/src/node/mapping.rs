//! Mapping node: string keys to properties

use crate::action::Action;
use crate::model::push_action;
use crate::node::{type_tag, Node, Payload};
use crate::notification::Notification;
use crate::property::Property;

use std::collections::BTreeMap;

/// Typed facade over a mapping node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingNode {
    node: Node,
}

impl MappingNode {
    /// Create a free, empty mapping node.
    pub fn new() -> Self {
        Self {
            node: Node::from_payload(type_tag::MAPPING, Payload::Mapping(BTreeMap::new())),
        }
    }

    pub fn from_node(node: Node) -> Option<Self> {
        node.with_payload(|p| matches!(p, Payload::Mapping(_)))
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
            Payload::Mapping(map) => map.len(),
            _ => unreachable!(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `key`; `Property::Empty` when the key is absent.
    pub fn get(&self, key: &str) -> Property {
        self.node.with_payload(|p| match p {
            Payload::Mapping(map) => map.get(key).cloned().unwrap_or_default(),
            _ => unreachable!(),
        })
    }

    pub fn keys(&self) -> Vec<String> {
        self.node.with_payload(|p| match p {
            Payload::Mapping(map) => map.keys().cloned().collect(),
            _ => unreachable!(),
        })
    }

    pub fn entries(&self) -> Vec<(String, Property)> {
        self.node.with_payload(|p| match p {
            Payload::Mapping(map) => map
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            _ => unreachable!(),
        })
    }

    /// Assign `value` to `key`. An empty value removes the key. Returns
    /// `false` when nothing changes: assigning empty to an absent key, or
    /// a value equal to the current one.
    pub fn set(&self, key: &str, value: Property) -> bool {
        assert!(self.node.is_writable(), "mapping node is not writable");

        let current = self.get(key);
        match (&current, &value) {
            (Property::Empty, Property::Empty) => return false,
            (current, value) if current == value => return false,
            _ => {}
        }
        if let Property::Node(child) = &value {
            assert!(child.is_free(), "mapping assignment of a non-free node");
        }

        let action = assign_in_tx(&self.node, key.to_string(), value);
        push_action(&self.node, action);
        true
    }

    /// Remove `key`; equivalent to assigning the empty property.
    pub fn unset(&self, key: &str) -> bool {
        self.set(key, Property::Empty)
    }
}

impl Default for MappingNode {
    fn default() -> Self {
        Self::new()
    }
}

impl From<MappingNode> for Node {
    fn from(n: MappingNode) -> Node {
        n.node
    }
}

fn map_mut<'a>(payload: &'a mut Payload) -> &'a mut BTreeMap<String, Property> {
    match payload {
        Payload::Mapping(map) => map,
        _ => unreachable!("mapping action on a non-mapping node"),
    }
}

/// Apply one key assignment. The current value is captured into the
/// action so undo can restore it; empty values remove the key.
pub(crate) fn assign_in_tx(node: &Node, key: String, value: Property) -> Action {
    node.begin_action();

    let old_value = node.with_payload(|p| match p {
        Payload::Mapping(map) => map.get(&key).cloned().unwrap_or_default(),
        _ => unreachable!(),
    });
    let action = Action::MappingAssign {
        parent: node.clone(),
        key,
        value,
        old_value,
    };

    node.notify(&Notification::ActionAboutToTrigger(&action));

    if let Action::MappingAssign {
        key,
        value,
        old_value,
        ..
    } = &action
    {
        node.with_payload_mut(|p| {
            let map = map_mut(p);
            if value.is_valid() {
                map.insert(key.clone(), value.clone());
            } else {
                map.remove(key);
            }
        });
        if let Property::Node(old_child) = old_value {
            node.remove_child(old_child);
        }
        if let Property::Node(new_child) = value {
            node.add_child(new_child);
        }
    }

    node.notify(&Notification::ActionTriggered(&action));
    node.end_action();
    action
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::BytesNode;
    use chronicle_variant::Variant;

    #[test]
    fn test_set_and_get() {
        let mapping = MappingNode::new();
        assert!(mapping.set("x", Variant::from(1i32).into()));
        assert_eq!(mapping.get("x"), Property::from(Variant::from(1i32)));
        assert_eq!(mapping.get("missing"), Property::Empty);
        assert_eq!(mapping.keys(), vec!["x".to_string()]);
    }

    #[test]
    fn test_equal_assignment_is_a_no_op() {
        let mapping = MappingNode::new();
        mapping.set("x", Variant::from(1i32).into());
        assert!(!mapping.set("x", Variant::from(1i32).into()));
        assert!(!mapping.set("absent", Property::Empty));
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn test_empty_value_removes_key() {
        let mapping = MappingNode::new();
        mapping.set("x", Variant::from(1i32).into());
        assert!(mapping.unset("x"));
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_node_values_join_and_leave_the_tree() {
        let mapping = MappingNode::new();
        let child = BytesNode::with_data(b"leaf").into_node();
        mapping.set("child", child.clone().into());
        assert_eq!(child.parent().unwrap(), *mapping.node());

        let replacement = BytesNode::new().into_node();
        mapping.set("child", replacement.clone().into());
        assert!(child.parent().is_none());
        assert_eq!(replacement.parent().unwrap(), *mapping.node());
    }
}
