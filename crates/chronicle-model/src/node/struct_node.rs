//! Struct node: a fixed-arity tuple of property slots

use crate::action::Action;
use crate::model::push_action;
use crate::node::{type_tag, Node, Payload};
use crate::notification::Notification;
use crate::property::Property;

/// Typed facade over a struct node. The arity is fixed at construction;
/// slots start empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructNode {
    node: Node,
}

impl StructNode {
    /// Create a free struct node with `arity` empty slots.
    pub fn new(arity: usize) -> Self {
        Self {
            node: Node::from_payload(
                type_tag::STRUCT,
                Payload::Struct(vec![Property::Empty; arity]),
            ),
        }
    }

    pub fn from_node(node: Node) -> Option<Self> {
        node.with_payload(|p| matches!(p, Payload::Struct(_)))
            .then_some(Self { node })
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn into_node(self) -> Node {
        self.node
    }

    pub fn arity(&self) -> usize {
        self.node.with_payload(|p| match p {
            Payload::Struct(slots) => slots.len(),
            _ => unreachable!(),
        })
    }

    pub fn get(&self, index: usize) -> Property {
        self.node.with_payload(|p| match p {
            Payload::Struct(slots) => slots
                .get(index)
                .cloned()
                .unwrap_or_else(|| panic!("struct index {} out of range", index)),
            _ => unreachable!(),
        })
    }

    pub fn slots(&self) -> Vec<Property> {
        self.node.with_payload(|p| match p {
            Payload::Struct(slots) => slots.clone(),
            _ => unreachable!(),
        })
    }

    /// Assign `value` to the slot at `index`. Returns `false` when the
    /// slot already holds an equal value.
    pub fn assign(&self, index: usize, value: Property) -> bool {
        assert!(self.node.is_writable(), "struct node is not writable");
        let arity = self.arity();
        assert!(
            index < arity,
            "struct index {} out of range (arity {})",
            index,
            arity
        );

        if self.get(index) == value {
            return false;
        }
        if let Property::Node(child) = &value {
            assert!(child.is_free(), "struct assignment of a non-free node");
        }

        let action = assign_in_tx(&self.node, index, value);
        push_action(&self.node, action);
        true
    }
}

impl From<StructNode> for Node {
    fn from(n: StructNode) -> Node {
        n.node
    }
}

fn slots_mut<'a>(payload: &'a mut Payload) -> &'a mut Vec<Property> {
    match payload {
        Payload::Struct(slots) => slots,
        _ => unreachable!("struct action on a non-struct node"),
    }
}

pub(crate) fn assign_in_tx(node: &Node, index: usize, value: Property) -> Action {
    node.begin_action();

    let old_value = node.with_payload(|p| match p {
        Payload::Struct(slots) => slots[index].clone(),
        _ => unreachable!(),
    });
    let action = Action::StructAssign {
        parent: node.clone(),
        index,
        value,
        old_value,
    };

    node.notify(&Notification::ActionAboutToTrigger(&action));

    if let Action::StructAssign {
        index,
        value,
        old_value,
        ..
    } = &action
    {
        node.with_payload_mut(|p| {
            slots_mut(p)[*index] = value.clone();
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
