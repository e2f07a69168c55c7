//! The polymorphic node family
//!
//! A [`Node`] is a cheap handle (`Rc<RefCell<_>>`) to one tree node.
//! Parent and model back-references are weak; a parent exclusively owns
//! its children's structural slots and the model owns the root, so strong
//! references only ever point downward.
//!
//! Lifecycle: a node starts `Created` (free), becomes `Active` when
//! attached to a parent or set as root, and `Detached` when an action
//! removes it. Ids are assigned when the node first becomes active inside
//! a model, at commit time.

pub(crate) mod bytes;
pub(crate) mod custom;
pub(crate) mod mapping;
pub(crate) mod sheet;
pub(crate) mod struct_node;
pub(crate) mod vector;

pub use bytes::BytesNode;
pub use custom::{
    register_action_type, register_node_type, ActionReadFn, CustomAction, CustomPayload,
    NodeReadFn,
};
pub use mapping::MappingNode;
pub use sheet::SheetNode;
pub use struct_node::StructNode;
pub use vector::VectorNode;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use chronicle_stream::{Result, StreamError, StreamReader, StreamWriter};
use chronicle_variant::Variant;

use crate::model::{Model, ModelShared, ModelState};
use crate::notification::{self, Notification, Subscriber};
use crate::property::Property;

/// Fixed wire tags for the built-in node kinds.
pub mod type_tag {
    pub const BYTES: i32 = 0;
    pub const VECTOR: i32 = 1;
    pub const MAPPING: i32 = 2;
    pub const SHEET: i32 = 3;
    pub const STRUCT: i32 = 4;
    /// User-registered node tags start here.
    pub const USER_OFFSET: i32 = 1024;
}

/// The kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Bytes,
    Vector,
    Mapping,
    Sheet,
    Struct,
    User(i32),
}

impl NodeType {
    pub fn tag(self) -> i32 {
        match self {
            NodeType::Bytes => type_tag::BYTES,
            NodeType::Vector => type_tag::VECTOR,
            NodeType::Mapping => type_tag::MAPPING,
            NodeType::Sheet => type_tag::SHEET,
            NodeType::Struct => type_tag::STRUCT,
            NodeType::User(tag) => tag,
        }
    }

    pub fn from_tag(tag: i32) -> Option<NodeType> {
        match tag {
            type_tag::BYTES => Some(NodeType::Bytes),
            type_tag::VECTOR => Some(NodeType::Vector),
            type_tag::MAPPING => Some(NodeType::Mapping),
            type_tag::SHEET => Some(NodeType::Sheet),
            type_tag::STRUCT => Some(NodeType::Struct),
            tag if tag >= type_tag::USER_OFFSET => Some(NodeType::User(tag)),
            _ => None,
        }
    }
}

/// Lifecycle state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Just created; not yet attached anywhere.
    Created,
    /// On the tree.
    Active,
    /// Removed from the tree by an action; may come back on undo.
    Detached,
}

/// Payload of a sheet node: id-keyed children plus the monotonic id
/// high-water mark. `max_id` never decreases, even across removals.
pub(crate) struct SheetData {
    pub entries: BTreeMap<u32, Node>,
    pub max_id: u32,
}

/// Kind-specific storage.
pub(crate) enum Payload {
    Bytes(Vec<u8>),
    Vector(Vec<Node>),
    Mapping(BTreeMap<String, Property>),
    Sheet(SheetData),
    Struct(Vec<Property>),
    Custom(Box<dyn CustomPayload>),
}

pub(crate) struct NodeInner {
    type_tag: i32,
    state: NodeState,
    id: u64,
    parent: Option<WeakNode>,
    model: Option<Weak<ModelShared>>,
    payload: Payload,
    subscribers: Vec<Rc<dyn Subscriber>>,
}

impl Drop for NodeInner {
    fn drop(&mut self) {
        // Release the id unless the whole model is being cleared.
        if self.id > 0 {
            if let Some(shared) = self.model.as_ref().and_then(Weak::upgrade) {
                if !shared.clearing.get() {
                    shared.index.borrow_mut().remove(self.id);
                }
            }
        }
    }
}

/// Handle to a node. Cloning the handle clones the reference, not the
/// subtree; use [`deep_clone`](Node::deep_clone) for a structural copy.
pub struct Node {
    pub(crate) inner: Rc<RefCell<NodeInner>>,
}

/// Non-owning node handle, used by parent links and the id index.
pub struct WeakNode {
    inner: Weak<RefCell<NodeInner>>,
}

impl Clone for Node {
    fn clone(&self) -> Self {
        Node {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl Clone for WeakNode {
    fn clone(&self) -> Self {
        WeakNode {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl WeakNode {
    pub fn upgrade(&self) -> Option<Node> {
        self.inner.upgrade().map(|inner| Node { inner })
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Node")
            .field("type", &NodeType::from_tag(inner.type_tag))
            .field("state", &inner.state)
            .field("id", &inner.id)
            .finish()
    }
}

impl Node {
    pub(crate) fn from_payload(type_tag: i32, payload: Payload) -> Node {
        Node {
            inner: Rc::new(RefCell::new(NodeInner {
                type_tag,
                state: NodeState::Created,
                id: 0,
                parent: None,
                model: None,
                payload,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Wrap a user-defined payload in a free node. The payload's children
    /// must be free; they are attached to the new node here.
    pub fn new_custom(payload: Box<dyn CustomPayload>) -> Node {
        let tag = payload.type_tag();
        assert!(
            tag >= type_tag::USER_OFFSET,
            "custom node tag {} is below the reserved offset",
            tag
        );
        let children = payload.children();
        let node = Node::from_payload(tag, Payload::Custom(payload));
        for child in &children {
            node.adopt_child(child);
        }
        node
    }

    // ========== Identity and lifecycle ==========

    pub fn node_type(&self) -> NodeType {
        NodeType::from_tag(self.inner.borrow().type_tag).expect("node carries a valid type tag")
    }

    pub fn type_tag(&self) -> i32 {
        self.inner.borrow().type_tag
    }

    pub fn state(&self) -> NodeState {
        self.inner.borrow().state
    }

    /// Stable id within the owning model; zero until first commit.
    pub fn id(&self) -> u64 {
        self.inner.borrow().id
    }

    pub fn parent(&self) -> Option<Node> {
        self.inner.borrow().parent.as_ref().and_then(WeakNode::upgrade)
    }

    pub fn model(&self) -> Option<Model> {
        self.model_shared().map(Model::from_shared)
    }

    /// A free node has never been attached: no parent, no model.
    pub fn is_free(&self) -> bool {
        self.inner.borrow().state == NodeState::Created
    }

    /// A node is detached when itself or any ancestor was removed.
    pub fn is_detached(&self) -> bool {
        if self.is_free() {
            return false;
        }
        if self.state() == NodeState::Detached {
            return true;
        }
        match self.parent() {
            Some(parent) => parent.is_detached(),
            None => false,
        }
    }

    /// A node accepts structural change while it belongs to no model, or
    /// while its model is in a transaction and no node holds the action
    /// lock.
    pub fn is_writable(&self) -> bool {
        match self.model_shared() {
            None => true,
            Some(shared) => {
                shared.state.get() == ModelState::Transaction && !shared.locked.get()
            }
        }
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakNode {
        WeakNode {
            inner: Rc::downgrade(&self.inner),
        }
    }

    // ========== Facade accessors ==========

    pub fn as_bytes(&self) -> Option<BytesNode> {
        BytesNode::from_node(self.clone())
    }

    pub fn as_vector(&self) -> Option<VectorNode> {
        VectorNode::from_node(self.clone())
    }

    pub fn as_mapping(&self) -> Option<MappingNode> {
        MappingNode::from_node(self.clone())
    }

    pub fn as_sheet(&self) -> Option<SheetNode> {
        SheetNode::from_node(self.clone())
    }

    pub fn as_struct(&self) -> Option<StructNode> {
        StructNode::from_node(self.clone())
    }

    // ========== Traversal and copying ==========

    /// Invoke `f` on this node and every descendant exactly once,
    /// pre-order.
    pub fn propagate(&self, f: &mut dyn FnMut(&Node)) {
        f(self);
        for child in self.children() {
            child.propagate(f);
        }
    }

    /// Direct children, in structural order.
    pub fn children(&self) -> Vec<Node> {
        let inner = self.inner.borrow();
        match &inner.payload {
            Payload::Bytes(_) => Vec::new(),
            Payload::Vector(children) => children.clone(),
            Payload::Mapping(map) => map
                .values()
                .filter_map(|p| p.node().cloned())
                .collect(),
            Payload::Sheet(sheet) => sheet.entries.values().cloned().collect(),
            Payload::Struct(slots) => slots
                .iter()
                .filter_map(|p| p.node().cloned())
                .collect(),
            Payload::Custom(payload) => payload.children(),
        }
    }

    /// Structural copy of the whole subtree as a free tree.
    ///
    /// With `copy_id` the ids of every node are preserved, which is what
    /// deserialization and detached action materialization need; without
    /// it all ids are zero and are reassigned on the next insertion.
    pub fn deep_clone(&self, copy_id: bool) -> Node {
        let inner = self.inner.borrow();
        let clone = match &inner.payload {
            Payload::Bytes(data) => {
                Node::from_payload(inner.type_tag, Payload::Bytes(data.clone()))
            }
            Payload::Vector(children) => {
                let copies: Vec<Node> =
                    children.iter().map(|c| c.deep_clone(copy_id)).collect();
                let node =
                    Node::from_payload(inner.type_tag, Payload::Vector(copies.clone()));
                for copy in &copies {
                    node.adopt_child(copy);
                }
                node
            }
            Payload::Mapping(map) => {
                let mut copies = BTreeMap::new();
                let mut child_copies = Vec::new();
                for (key, prop) in map {
                    let prop = match prop {
                        Property::Node(child) => {
                            let copy = child.deep_clone(copy_id);
                            child_copies.push(copy.clone());
                            Property::Node(copy)
                        }
                        other => other.clone(),
                    };
                    copies.insert(key.clone(), prop);
                }
                let node = Node::from_payload(inner.type_tag, Payload::Mapping(copies));
                for copy in &child_copies {
                    node.adopt_child(copy);
                }
                node
            }
            Payload::Sheet(sheet) => {
                let mut entries = BTreeMap::new();
                let mut child_copies = Vec::new();
                for (id, child) in &sheet.entries {
                    let copy = child.deep_clone(copy_id);
                    child_copies.push(copy.clone());
                    entries.insert(*id, copy);
                }
                let node = Node::from_payload(
                    inner.type_tag,
                    Payload::Sheet(SheetData {
                        entries,
                        max_id: sheet.max_id,
                    }),
                );
                for copy in &child_copies {
                    node.adopt_child(copy);
                }
                node
            }
            Payload::Struct(slots) => {
                let mut copies = Vec::with_capacity(slots.len());
                let mut child_copies = Vec::new();
                for prop in slots {
                    let prop = match prop {
                        Property::Node(child) => {
                            let copy = child.deep_clone(copy_id);
                            child_copies.push(copy.clone());
                            Property::Node(copy)
                        }
                        other => other.clone(),
                    };
                    copies.push(prop);
                }
                let node = Node::from_payload(inner.type_tag, Payload::Struct(copies));
                for copy in &child_copies {
                    node.adopt_child(copy);
                }
                node
            }
            Payload::Custom(payload) => {
                let copy = payload.deep_clone(copy_id);
                let children = copy.children();
                let node = Node::from_payload(inner.type_tag, Payload::Custom(copy));
                for child in &children {
                    node.adopt_child(child);
                }
                node
            }
        };
        if copy_id {
            clone.inner.borrow_mut().id = inner.id;
        }
        clone
    }

    // ========== Subscriptions ==========

    pub fn subscribe(&self, subscriber: Rc<dyn Subscriber>) {
        self.inner.borrow_mut().subscribers.push(subscriber);
    }

    pub fn unsubscribe(&self, subscriber: &Rc<dyn Subscriber>) {
        self.inner
            .borrow_mut()
            .subscribers
            .retain(|s| !Rc::ptr_eq(s, subscriber));
    }

    // ========== Structural hooks (used by mutation helpers) ==========

    /// Take ownership of `child`: set its parent and activate it. The
    /// replay path re-adds previously detached children, so only the
    /// absence of a parent is checked here; the free-node precondition
    /// lives in the public mutation methods.
    pub(crate) fn add_child(&self, child: &Node) {
        debug_assert!(child.parent().is_none(), "child already has a parent");
        let mut inner = child.inner.borrow_mut();
        inner.parent = Some(self.downgrade());
        inner.state = NodeState::Active;
    }

    /// Release `child`. Inside a model the child becomes detached; a free
    /// tree just drops the link.
    pub(crate) fn remove_child(&self, child: &Node) {
        let in_model = self.inner.borrow().model.is_some();
        let mut inner = child.inner.borrow_mut();
        inner.parent = None;
        if in_model {
            inner.state = NodeState::Detached;
        }
    }

    /// Like [`add_child`](Node::add_child), used while building free
    /// structures (clone, deserialization, custom payload wiring).
    pub(crate) fn adopt_child(&self, child: &Node) {
        let mut inner = child.inner.borrow_mut();
        inner.parent = Some(self.downgrade());
        inner.state = NodeState::Active;
    }

    /// Acquire the model's action lock for the duration of one mutation,
    /// so notification handlers cannot re-enter.
    pub(crate) fn begin_action(&self) {
        if let Some(shared) = self.model_shared() {
            shared.locked.set(true);
        }
    }

    pub(crate) fn end_action(&self) {
        if let Some(shared) = self.model_shared() {
            shared.locked.set(false);
        }
    }

    /// Deliver to this node's subscribers, then bubble action
    /// notifications up to the model's observers.
    pub(crate) fn notify(&self, notification: &Notification<'_>) {
        let subscribers = self.inner.borrow().subscribers.clone();
        notification::dispatch(&subscribers, notification);
        if notification.is_action() {
            if let Some(shared) = self.model_shared() {
                crate::model::notify_observers(&shared, notification);
            }
        }
    }

    // ========== Model association ==========

    pub(crate) fn model_shared(&self) -> Option<Rc<ModelShared>> {
        self.inner.borrow().model.as_ref().and_then(Weak::upgrade)
    }

    /// Associate this single node with a model and register its id.
    /// Called through `propagate` when a commit lands the subtree.
    pub(crate) fn attach_to_model(&self, shared: &Rc<ModelShared>) {
        let id = {
            let inner = self.inner.borrow();
            inner.id
        };
        let id = shared.index.borrow_mut().add(self, id);
        let mut inner = self.inner.borrow_mut();
        inner.model = Some(Rc::downgrade(shared));
        inner.id = id;
    }

    pub(crate) fn set_state(&self, state: NodeState) {
        self.inner.borrow_mut().state = state;
    }

    pub(crate) fn set_id(&self, id: u64) {
        self.inner.borrow_mut().id = id;
    }

    pub(crate) fn with_payload<R>(&self, f: impl FnOnce(&Payload) -> R) -> R {
        f(&self.inner.borrow().payload)
    }

    pub(crate) fn with_payload_mut<R>(&self, f: impl FnOnce(&mut Payload) -> R) -> R {
        f(&mut self.inner.borrow_mut().payload)
    }

    /// Read access to a user-defined payload.
    pub fn with_custom_payload<R>(&self, f: impl FnOnce(&dyn CustomPayload) -> R) -> Option<R> {
        self.with_payload(|p| match p {
            Payload::Custom(payload) => Some(f(payload.as_ref())),
            _ => None,
        })
    }

    /// Write access to a user-defined payload. Must only be used from a
    /// custom action's mutation path; see [`CustomAction`].
    pub fn with_custom_payload_mut<R>(
        &self,
        f: impl FnOnce(&mut dyn CustomPayload) -> R,
    ) -> Option<R> {
        self.with_payload_mut(|p| match p {
            Payload::Custom(payload) => Some(f(payload.as_mut())),
            _ => None,
        })
    }

    /// Run one custom mutation the way the built-in kinds do: take the
    /// action lock, fire the pre-notification, apply `mutate`, fire the
    /// post-notification, release the lock.
    ///
    /// `action` is the record describing the mutation; a replaying
    /// [`CustomAction::execute`] typically rebuilds it via
    /// [`CustomAction::detached`] before calling in here.
    pub fn custom_edit<R>(
        &self,
        action: &crate::action::Action,
        mutate: impl FnOnce(&Node) -> R,
    ) -> R {
        self.begin_action();
        self.notify(&Notification::ActionAboutToTrigger(action));
        let result = mutate(self);
        self.notify(&Notification::ActionTriggered(action));
        self.end_action();
        result
    }

    // ========== Wire format ==========

    /// Serialize this subtree: `i32 type_tag`, `u64 id`, then the
    /// kind-specific payload with nested child records.
    pub fn write(&self, out: &mut StreamWriter<'_>) -> Result<()> {
        let inner = self.inner.borrow();
        out.write_i32(inner.type_tag)?;
        out.write_u64(inner.id)?;
        match &inner.payload {
            Payload::Bytes(data) => out.write_byte_block(data),
            Payload::Vector(children) => {
                out.write_i32(children.len() as i32)?;
                for child in children {
                    child.write(out)?;
                }
                Ok(())
            }
            Payload::Mapping(map) => {
                let nodes: Vec<(&String, &Node)> = map
                    .iter()
                    .filter_map(|(k, p)| p.node().map(|n| (k, n)))
                    .collect();
                let variants: Vec<(&String, &Variant)> = map
                    .iter()
                    .filter_map(|(k, p)| p.variant().map(|v| (k, v)))
                    .collect();
                out.write_i32(nodes.len() as i32)?;
                for (key, node) in nodes {
                    out.write_string(key)?;
                    node.write(out)?;
                }
                out.write_i32(variants.len() as i32)?;
                for (key, variant) in variants {
                    out.write_string(key)?;
                    variant.write(out)?;
                }
                Ok(())
            }
            Payload::Sheet(sheet) => {
                out.write_i32(sheet.max_id as i32)?;
                out.write_i32(sheet.entries.len() as i32)?;
                for (id, child) in &sheet.entries {
                    out.write_i32(*id as i32)?;
                    child.write(out)?;
                }
                Ok(())
            }
            Payload::Struct(slots) => {
                out.write_i32(slots.len() as i32)?;
                for slot in slots {
                    slot.write_inline(out)?;
                }
                Ok(())
            }
            Payload::Custom(payload) => payload.write(out),
        }
    }

    /// Deserialize a subtree written by [`write`](Node::write). The
    /// result is a free tree whose ids are preserved for index
    /// reconstruction; unknown type tags fail the read.
    pub fn read(reader: &mut StreamReader<'_>) -> Result<Node> {
        let tag = reader.read_i32()?;
        let id = reader.read_u64()?;
        let node = match tag {
            type_tag::BYTES => {
                let data = reader.read_byte_block()?;
                Node::from_payload(tag, Payload::Bytes(data))
            }
            type_tag::VECTOR => {
                let count = reader.read_len()?;
                let mut children = Vec::with_capacity(count);
                for _ in 0..count {
                    children.push(Node::read(reader)?);
                }
                let node = Node::from_payload(tag, Payload::Vector(children.clone()));
                for child in &children {
                    node.adopt_child(child);
                }
                node
            }
            type_tag::MAPPING => {
                let node_count = reader.read_len()?;
                let mut map = BTreeMap::new();
                let mut children = Vec::with_capacity(node_count);
                for _ in 0..node_count {
                    let key = reader.read_string()?;
                    let child = Node::read(reader)?;
                    children.push(child.clone());
                    map.insert(key, Property::Node(child));
                }
                let variant_count = reader.read_len()?;
                for _ in 0..variant_count {
                    let key = reader.read_string()?;
                    let variant = Variant::read(reader)?;
                    map.insert(key, Property::Variant(variant));
                }
                let node = Node::from_payload(tag, Payload::Mapping(map));
                for child in &children {
                    node.adopt_child(child);
                }
                node
            }
            type_tag::SHEET => {
                let max_id = reader.read_i32()?;
                if max_id < 0 {
                    return Err(StreamError::InvalidLength(max_id as i64));
                }
                let count = reader.read_len()?;
                let mut entries = BTreeMap::new();
                let mut children = Vec::with_capacity(count);
                for _ in 0..count {
                    let entry_id = reader.read_i32()?;
                    if entry_id <= 0 {
                        return Err(StreamError::InvalidLength(entry_id as i64));
                    }
                    let child = Node::read(reader)?;
                    children.push(child.clone());
                    entries.insert(entry_id as u32, child);
                }
                let node = Node::from_payload(
                    tag,
                    Payload::Sheet(SheetData {
                        entries,
                        max_id: max_id as u32,
                    }),
                );
                for child in &children {
                    node.adopt_child(child);
                }
                node
            }
            type_tag::STRUCT => {
                let arity = reader.read_len()?;
                let mut slots = Vec::with_capacity(arity);
                let mut children = Vec::new();
                for _ in 0..arity {
                    let prop = Property::read_inline(reader)?;
                    if let Property::Node(child) = &prop {
                        children.push(child.clone());
                    }
                    slots.push(prop);
                }
                let node = Node::from_payload(tag, Payload::Struct(slots));
                for child in &children {
                    node.adopt_child(child);
                }
                node
            }
            tag if tag >= type_tag::USER_OFFSET => {
                let payload = custom::read_custom_payload(tag, reader)?;
                let children = payload.children();
                let node = Node::from_payload(tag, Payload::Custom(payload));
                for child in &children {
                    node.adopt_child(child);
                }
                node
            }
            tag => return Err(StreamError::InvalidTag(tag)),
        };
        node.set_id(id);
        Ok(node)
    }
}
