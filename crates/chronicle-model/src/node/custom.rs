//! User-defined node and action kinds
//!
//! Applications extend the node family by implementing [`CustomPayload`]
//! and registering a deserializer under a type tag at or above the
//! reserved offset. Custom mutations are expressed as [`CustomAction`]s
//! and flow through the same transaction buffer as the built-in kinds.
//!
//! Both registries are process-wide and guarded by reader-writer locks;
//! registration and lookup may happen from any thread.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use chronicle_stream::{Result, StreamError, StreamReader, StreamWriter};
use lazy_static::lazy_static;

use crate::node::Node;

/// Kind-specific storage of a user-defined node.
pub trait CustomPayload: fmt::Debug {
    /// Wire tag; must be `>= type_tag::USER_OFFSET`.
    fn type_tag(&self) -> i32;

    /// Direct children, in structural order. Default: a leaf.
    fn children(&self) -> Vec<Node> {
        Vec::new()
    }

    /// Deep copy, cloning every child with `Node::deep_clone(copy_id)`.
    /// The returned payload's children must be fresh free nodes.
    fn deep_clone(&self, copy_id: bool) -> Box<dyn CustomPayload>;

    /// Serialize the payload body. The node record header (tag and id)
    /// is written by the core.
    fn write(&self, out: &mut StreamWriter<'_>) -> Result<()>;

    /// Downcast support for typed facades over user nodes.
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A user-defined reversible mutation.
///
/// `execute` must apply (or invert) the edit through
/// `Node::with_custom_payload_mut`, firing pre/post notifications with
/// the node's `notify` path the way the built-in helpers do.
pub trait CustomAction: fmt::Debug {
    /// Wire tag; must be `>= action_tag::USER_OFFSET`.
    fn type_tag(&self) -> i32;

    /// Apply the mutation forward (`undo = false`) or backward.
    fn execute(&self, undo: bool);

    /// Report the nodes this action inserted into (or removed from) the
    /// tree, so commit can associate fresh subtrees with the model.
    fn query_nodes(&self, inserted: bool, add: &mut dyn FnMut(&Node)) {
        let _ = (inserted, add);
    }

    /// Clone with every referenced subtree deep-cloned, ids preserved.
    fn detached(&self) -> Box<dyn CustomAction>;

    /// Serialize the action body (the tag is written by the core).
    fn write(&self, out: &mut StreamWriter<'_>) -> Result<()>;

    /// Resolve id placeholders captured during deserialization.
    fn resolve(&mut self, find: &dyn Fn(u64) -> Option<Node>) -> Result<()> {
        let _ = find;
        Ok(())
    }
}

/// Deserializer for a registered node kind; reads the payload body.
pub type NodeReadFn = fn(&mut StreamReader<'_>) -> Result<Box<dyn CustomPayload>>;

/// Deserializer for a registered action kind; reads the action body.
pub type ActionReadFn = fn(&mut StreamReader<'_>) -> Result<Box<dyn CustomAction>>;

lazy_static! {
    static ref NODE_FACTORIES: RwLock<HashMap<i32, NodeReadFn>> = RwLock::new(HashMap::new());
    static ref ACTION_FACTORIES: RwLock<HashMap<i32, ActionReadFn>> = RwLock::new(HashMap::new());
}

/// Register a node deserializer. Returns `false` when the tag is below
/// the reserved offset or already taken.
pub fn register_node_type(type_tag: i32, read: NodeReadFn) -> bool {
    if type_tag < super::type_tag::USER_OFFSET {
        return false;
    }
    let mut factories = NODE_FACTORIES.write().unwrap();
    if factories.contains_key(&type_tag) {
        return false;
    }
    factories.insert(type_tag, read);
    true
}

/// Register an action deserializer. Same rules as
/// [`register_node_type`].
pub fn register_action_type(type_tag: i32, read: ActionReadFn) -> bool {
    if type_tag < crate::action::action_tag::USER_OFFSET {
        return false;
    }
    let mut factories = ACTION_FACTORIES.write().unwrap();
    if factories.contains_key(&type_tag) {
        return false;
    }
    factories.insert(type_tag, read);
    true
}

pub(crate) fn read_custom_payload(
    type_tag: i32,
    reader: &mut StreamReader<'_>,
) -> Result<Box<dyn CustomPayload>> {
    let read = {
        let factories = NODE_FACTORIES.read().unwrap();
        match factories.get(&type_tag) {
            Some(read) => *read,
            None => return Err(StreamError::UnknownType(type_tag)),
        }
    };
    read(reader)
}

pub(crate) fn read_custom_action(
    type_tag: i32,
    reader: &mut StreamReader<'_>,
) -> Result<Box<dyn CustomAction>> {
    let read = {
        let factories = ACTION_FACTORIES.read().unwrap();
        match factories.get(&type_tag) {
            Some(read) => *read,
            None => return Err(StreamError::UnknownType(type_tag)),
        }
    };
    read(reader)
}
