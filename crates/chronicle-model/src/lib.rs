//! Chronicle document model
//!
//! An in-memory, transactional, undoable document model: a tree of typed
//! nodes (bytes buffers, ordered sequences, keyed mappings, auto-indexed
//! sheets, fixed-arity tuples) with atomic multi-step mutations and a
//! reversible action log.
//!
//! The flow: open a transaction on a [`Model`], mutate nodes through
//! their typed facades (each mutation records an [`Action`] and fires
//! pre/post notifications), then commit. The committed buffer moves to
//! the [`StorageEngine`], which replays it backwards for undo and
//! forwards for redo.
//!
//! ```
//! use chronicle_model::{BytesNode, MemoryEngine, Model, StepMessage};
//!
//! let model = Model::new(Box::new(MemoryEngine::new()));
//!
//! model.begin_transaction();
//! let text = BytesNode::with_data(b"hello");
//! model.set_root(Some(text.node().clone()));
//! model.commit_transaction(StepMessage::new());
//!
//! model.begin_transaction();
//! text.append(b" world");
//! model.commit_transaction(StepMessage::new());
//!
//! model.undo();
//! assert_eq!(text.data(), b"hello");
//! model.redo();
//! assert_eq!(text.data(), b"hello world");
//! ```

pub mod action;
pub mod engine;
mod index;
pub mod memory;
pub mod model;
pub mod node;
pub mod notification;
pub mod property;

pub use action::{action_tag, Action, PendingAction, PendingProperty};
pub use engine::{StepMessage, StorageEngine};
pub use memory::MemoryEngine;
pub use model::{push_action, Model, ModelState, WeakModel};
pub use node::{
    register_action_type, register_node_type, type_tag, ActionReadFn, BytesNode, CustomAction,
    CustomPayload, MappingNode, Node, NodeReadFn, NodeState, NodeType, SheetNode, StructNode,
    VectorNode, WeakNode,
};
pub use notification::{Notification, Subscriber};
pub use property::Property;
