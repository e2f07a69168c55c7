//! Reversible action records
//!
//! Every structural edit produces one [`Action`] carrying enough state to
//! re-apply and invert itself exactly: inserts and removes are each
//! other's inverse, moves invert by recomputing the source/destination
//! pair, replaces and assigns carry both values.
//!
//! Replay re-enters the same `*_in_tx` helpers the live mutation used, so
//! undo and redo fire the same notifications and honor the action lock.

use chronicle_stream::{Result, StreamError, StreamReader, StreamWriter};
use chronicle_variant::Variant;

use crate::node::{bytes, custom, mapping, sheet, struct_node, vector};
use crate::node::{CustomAction, Node};
use crate::property::{prop_tag, Property};

/// Fixed wire tags for the built-in action kinds.
pub mod action_tag {
    pub const BYTES_REPLACE: i32 = 1;
    pub const BYTES_INSERT: i32 = 2;
    pub const BYTES_REMOVE: i32 = 3;
    pub const VECTOR_INSERT: i32 = 4;
    pub const VECTOR_MOVE: i32 = 5;
    pub const VECTOR_REMOVE: i32 = 6;
    pub const SHEET_INSERT: i32 = 7;
    pub const SHEET_REMOVE: i32 = 8;
    pub const MAPPING_ASSIGN: i32 = 9;
    pub const STRUCT_ASSIGN: i32 = 10;
    pub const ROOT_CHANGE: i32 = 11;
    /// User-registered action tags start here.
    pub const USER_OFFSET: i32 = 1024;
}

/// One reversible mutation record.
#[derive(Debug)]
pub enum Action {
    /// Swap the model root; either side may be absent.
    RootChange {
        old_root: Option<Node>,
        new_root: Option<Node>,
    },
    BytesInsert {
        parent: Node,
        index: usize,
        bytes: Vec<u8>,
    },
    BytesRemove {
        parent: Node,
        index: usize,
        bytes: Vec<u8>,
    },
    BytesReplace {
        parent: Node,
        index: usize,
        bytes: Vec<u8>,
        old_bytes: Vec<u8>,
    },
    VectorInsert {
        parent: Node,
        index: usize,
        children: Vec<Node>,
    },
    VectorRemove {
        parent: Node,
        index: usize,
        children: Vec<Node>,
    },
    /// `dest` is the destination index before the move.
    VectorMove {
        parent: Node,
        index: usize,
        count: usize,
        dest: usize,
    },
    SheetInsert {
        parent: Node,
        id: u32,
        child: Node,
    },
    SheetRemove {
        parent: Node,
        id: u32,
        child: Node,
    },
    MappingAssign {
        parent: Node,
        key: String,
        value: Property,
        old_value: Property,
    },
    StructAssign {
        parent: Node,
        index: usize,
        value: Property,
        old_value: Property,
    },
    Custom(Box<dyn CustomAction>),
}

impl Action {
    pub fn type_tag(&self) -> i32 {
        match self {
            Action::RootChange { .. } => action_tag::ROOT_CHANGE,
            Action::BytesInsert { .. } => action_tag::BYTES_INSERT,
            Action::BytesRemove { .. } => action_tag::BYTES_REMOVE,
            Action::BytesReplace { .. } => action_tag::BYTES_REPLACE,
            Action::VectorInsert { .. } => action_tag::VECTOR_INSERT,
            Action::VectorRemove { .. } => action_tag::VECTOR_REMOVE,
            Action::VectorMove { .. } => action_tag::VECTOR_MOVE,
            Action::SheetInsert { .. } => action_tag::SHEET_INSERT,
            Action::SheetRemove { .. } => action_tag::SHEET_REMOVE,
            Action::MappingAssign { .. } => action_tag::MAPPING_ASSIGN,
            Action::StructAssign { .. } => action_tag::STRUCT_ASSIGN,
            Action::Custom(custom) => custom.type_tag(),
        }
    }

    /// Re-apply (`undo = false`) or invert (`undo = true`) the recorded
    /// mutation.
    pub fn execute(&self, undo: bool) {
        match self {
            Action::RootChange { old_root, new_root } => {
                let shared = new_root
                    .as_ref()
                    .and_then(Node::model_shared)
                    .or_else(|| old_root.as_ref().and_then(Node::model_shared))
                    .expect("root change action with no model attached");
                let target = if undo { old_root.clone() } else { new_root.clone() };
                crate::model::set_root_in_tx(&shared, target);
            }
            Action::BytesInsert {
                parent,
                index,
                bytes,
            } => {
                if undo {
                    bytes::remove_in_tx(parent, *index, bytes.len());
                } else {
                    bytes::insert_in_tx(parent, *index, bytes.clone());
                }
            }
            Action::BytesRemove {
                parent,
                index,
                bytes,
            } => {
                if undo {
                    bytes::insert_in_tx(parent, *index, bytes.clone());
                } else {
                    bytes::remove_in_tx(parent, *index, bytes.len());
                }
            }
            Action::BytesReplace {
                parent,
                index,
                bytes,
                old_bytes,
            } => {
                let block = if undo { old_bytes } else { bytes };
                bytes::replace_in_tx(parent, *index, block.clone());
            }
            Action::VectorInsert {
                parent,
                index,
                children,
            } => {
                if undo {
                    vector::remove_in_tx(parent, *index, children.len());
                } else {
                    vector::insert_in_tx(parent, *index, children.clone());
                }
            }
            Action::VectorRemove {
                parent,
                index,
                children,
            } => {
                if undo {
                    vector::insert_in_tx(parent, *index, children.clone());
                } else {
                    vector::remove_in_tx(parent, *index, children.len());
                }
            }
            Action::VectorMove {
                parent,
                index,
                count,
                dest,
            } => {
                if undo {
                    let (r_index, r_dest) = if *dest > *index {
                        (dest - count, *index)
                    } else {
                        (*dest, index + count)
                    };
                    vector::move_in_tx(parent, r_index, *count, r_dest);
                } else {
                    vector::move_in_tx(parent, *index, *count, *dest);
                }
            }
            Action::SheetInsert { parent, id, child } => {
                if undo {
                    sheet::remove_in_tx(parent, *id);
                } else {
                    sheet::insert_in_tx(parent, *id, child.clone());
                }
            }
            Action::SheetRemove { parent, id, child } => {
                if undo {
                    sheet::insert_in_tx(parent, *id, child.clone());
                } else {
                    sheet::remove_in_tx(parent, *id);
                }
            }
            Action::MappingAssign {
                parent,
                key,
                value,
                old_value,
            } => {
                let target = if undo { old_value } else { value };
                mapping::assign_in_tx(parent, key.clone(), target.clone());
            }
            Action::StructAssign {
                parent,
                index,
                value,
                old_value,
            } => {
                let target = if undo { old_value } else { value };
                struct_node::assign_in_tx(parent, *index, target.clone());
            }
            Action::Custom(custom) => custom.execute(undo),
        }
    }

    /// Visit the subtrees this action brought into the tree
    /// (`inserted = true`) or took out of it (`inserted = false`).
    pub fn query_nodes(&self, inserted: bool, add: &mut dyn FnMut(&Node)) {
        match self {
            Action::RootChange { old_root, new_root } => {
                let side = if inserted { new_root } else { old_root };
                if let Some(node) = side {
                    add(node);
                }
            }
            Action::VectorInsert { children, .. } => {
                if inserted {
                    for child in children {
                        add(child);
                    }
                }
            }
            Action::VectorRemove { children, .. } => {
                if !inserted {
                    for child in children {
                        add(child);
                    }
                }
            }
            Action::SheetInsert { child, .. } => {
                if inserted {
                    add(child);
                }
            }
            Action::SheetRemove { child, .. } => {
                if !inserted {
                    add(child);
                }
            }
            Action::MappingAssign {
                value, old_value, ..
            }
            | Action::StructAssign {
                value, old_value, ..
            } => {
                let side = if inserted { value } else { old_value };
                if let Property::Node(node) = side {
                    add(node);
                }
            }
            Action::BytesInsert { .. }
            | Action::BytesRemove { .. }
            | Action::BytesReplace { .. }
            | Action::VectorMove { .. } => {}
            Action::Custom(custom) => custom.query_nodes(inserted, add),
        }
    }

    /// Clone with every referenced subtree deep-cloned, ids preserved, so
    /// the record stays valid after later mutations of the live tree.
    /// Parents stay as handles; they serialize as ids either way.
    pub fn detached(&self) -> Action {
        let clone_prop = |p: &Property| match p {
            Property::Node(node) => Property::Node(node.deep_clone(true)),
            other => other.clone(),
        };
        match self {
            Action::RootChange { old_root, new_root } => Action::RootChange {
                old_root: old_root.as_ref().map(|n| n.deep_clone(true)),
                new_root: new_root.as_ref().map(|n| n.deep_clone(true)),
            },
            Action::BytesInsert {
                parent,
                index,
                bytes,
            } => Action::BytesInsert {
                parent: parent.clone(),
                index: *index,
                bytes: bytes.clone(),
            },
            Action::BytesRemove {
                parent,
                index,
                bytes,
            } => Action::BytesRemove {
                parent: parent.clone(),
                index: *index,
                bytes: bytes.clone(),
            },
            Action::BytesReplace {
                parent,
                index,
                bytes,
                old_bytes,
            } => Action::BytesReplace {
                parent: parent.clone(),
                index: *index,
                bytes: bytes.clone(),
                old_bytes: old_bytes.clone(),
            },
            Action::VectorInsert {
                parent,
                index,
                children,
            } => Action::VectorInsert {
                parent: parent.clone(),
                index: *index,
                children: children.iter().map(|c| c.deep_clone(true)).collect(),
            },
            Action::VectorRemove {
                parent,
                index,
                children,
            } => Action::VectorRemove {
                parent: parent.clone(),
                index: *index,
                children: children.iter().map(|c| c.deep_clone(true)).collect(),
            },
            Action::VectorMove {
                parent,
                index,
                count,
                dest,
            } => Action::VectorMove {
                parent: parent.clone(),
                index: *index,
                count: *count,
                dest: *dest,
            },
            Action::SheetInsert { parent, id, child } => Action::SheetInsert {
                parent: parent.clone(),
                id: *id,
                child: child.deep_clone(true),
            },
            Action::SheetRemove { parent, id, child } => Action::SheetRemove {
                parent: parent.clone(),
                id: *id,
                child: child.deep_clone(true),
            },
            Action::MappingAssign {
                parent,
                key,
                value,
                old_value,
            } => Action::MappingAssign {
                parent: parent.clone(),
                key: key.clone(),
                value: clone_prop(value),
                old_value: clone_prop(old_value),
            },
            Action::StructAssign {
                parent,
                index,
                value,
                old_value,
            } => Action::StructAssign {
                parent: parent.clone(),
                index: *index,
                value: clone_prop(value),
                old_value: clone_prop(old_value),
            },
            Action::Custom(custom) => Action::Custom(custom.detached()),
        }
    }

    /// Serialize as `i32 type_tag` + body. Parents are written as ids;
    /// insert/remove payload subtrees are nested in full.
    pub fn write(&self, out: &mut StreamWriter<'_>) -> Result<()> {
        out.write_i32(self.type_tag())?;
        match self {
            Action::RootChange { old_root, new_root } => {
                out.write_u64(old_root.as_ref().map_or(0, Node::id))?;
                out.write_u64(new_root.as_ref().map_or(0, Node::id))
            }
            Action::BytesInsert {
                parent,
                index,
                bytes,
            }
            | Action::BytesRemove {
                parent,
                index,
                bytes,
            } => {
                out.write_u64(parent.id())?;
                out.write_i32(*index as i32)?;
                out.write_byte_block(bytes)
            }
            Action::BytesReplace {
                parent,
                index,
                bytes,
                old_bytes,
            } => {
                out.write_u64(parent.id())?;
                out.write_i32(*index as i32)?;
                out.write_byte_block(bytes)?;
                out.write_byte_block(old_bytes)
            }
            Action::VectorInsert {
                parent,
                index,
                children,
            }
            | Action::VectorRemove {
                parent,
                index,
                children,
            } => {
                out.write_u64(parent.id())?;
                out.write_i32(*index as i32)?;
                out.write_i32(children.len() as i32)?;
                for child in children {
                    child.write(out)?;
                }
                Ok(())
            }
            Action::VectorMove {
                parent,
                index,
                count,
                dest,
            } => {
                out.write_u64(parent.id())?;
                out.write_i32(*index as i32)?;
                out.write_i32(*count as i32)?;
                out.write_i32(*dest as i32)
            }
            Action::SheetInsert { parent, id, child }
            | Action::SheetRemove { parent, id, child } => {
                out.write_u64(parent.id())?;
                out.write_i32(*id as i32)?;
                child.write(out)
            }
            Action::MappingAssign {
                parent,
                key,
                value,
                old_value,
            } => {
                out.write_u64(parent.id())?;
                out.write_string(key)?;
                old_value.write_ref(out)?;
                value.write_ref(out)
            }
            Action::StructAssign {
                parent,
                index,
                value,
                old_value,
            } => {
                out.write_u64(parent.id())?;
                out.write_i32(*index as i32)?;
                old_value.write_ref(out)?;
                value.write_ref(out)
            }
            Action::Custom(custom) => custom.write(out),
        }
    }
}

/// A property read from an action record, before id resolution.
#[derive(Debug, Clone)]
pub enum PendingProperty {
    Empty,
    Variant(Variant),
    NodeId(u64),
}

impl PendingProperty {
    fn read(reader: &mut StreamReader<'_>) -> Result<PendingProperty> {
        let tag = reader.read_i32()?;
        match tag {
            prop_tag::EMPTY => Ok(PendingProperty::Empty),
            prop_tag::NODE_REF => Ok(PendingProperty::NodeId(reader.read_u64()?)),
            prop_tag::VARIANT => Ok(PendingProperty::Variant(Variant::read(reader)?)),
            tag => Err(StreamError::InvalidTag(tag)),
        }
    }

    fn resolve(self, find: &dyn Fn(u64) -> Option<Node>) -> Result<Property> {
        match self {
            PendingProperty::Empty => Ok(Property::Empty),
            PendingProperty::Variant(v) => Ok(Property::Variant(v)),
            PendingProperty::NodeId(id) => find(id)
                .map(Property::Node)
                .ok_or(StreamError::UnresolvedId(id)),
        }
    }
}

/// An action read from a stream, holding node-id placeholders until
/// [`resolve`](PendingAction::resolve) looks them up (typically against
/// a model's id index).
#[derive(Debug)]
pub enum PendingAction {
    RootChange {
        old_id: u64,
        new_id: u64,
    },
    BytesInsert {
        parent_id: u64,
        index: usize,
        bytes: Vec<u8>,
    },
    BytesRemove {
        parent_id: u64,
        index: usize,
        bytes: Vec<u8>,
    },
    BytesReplace {
        parent_id: u64,
        index: usize,
        bytes: Vec<u8>,
        old_bytes: Vec<u8>,
    },
    VectorInsert {
        parent_id: u64,
        index: usize,
        children: Vec<Node>,
    },
    VectorRemove {
        parent_id: u64,
        index: usize,
        children: Vec<Node>,
    },
    VectorMove {
        parent_id: u64,
        index: usize,
        count: usize,
        dest: usize,
    },
    SheetInsert {
        parent_id: u64,
        id: u32,
        child: Node,
    },
    SheetRemove {
        parent_id: u64,
        id: u32,
        child: Node,
    },
    MappingAssign {
        parent_id: u64,
        key: String,
        value: PendingProperty,
        old_value: PendingProperty,
    },
    StructAssign {
        parent_id: u64,
        index: usize,
        value: PendingProperty,
        old_value: PendingProperty,
    },
    Custom(Box<dyn CustomAction>),
}

impl PendingAction {
    /// Deserialize one action record. Payload subtrees are materialized
    /// as free nodes with preserved ids; node references stay pending.
    pub fn read(reader: &mut StreamReader<'_>) -> Result<PendingAction> {
        let tag = reader.read_i32()?;
        match tag {
            action_tag::ROOT_CHANGE => Ok(PendingAction::RootChange {
                old_id: reader.read_u64()?,
                new_id: reader.read_u64()?,
            }),
            action_tag::BYTES_INSERT | action_tag::BYTES_REMOVE => {
                let parent_id = reader.read_u64()?;
                let index = reader.read_len()?;
                let bytes = reader.read_byte_block()?;
                Ok(if tag == action_tag::BYTES_INSERT {
                    PendingAction::BytesInsert {
                        parent_id,
                        index,
                        bytes,
                    }
                } else {
                    PendingAction::BytesRemove {
                        parent_id,
                        index,
                        bytes,
                    }
                })
            }
            action_tag::BYTES_REPLACE => {
                let parent_id = reader.read_u64()?;
                let index = reader.read_len()?;
                let bytes = reader.read_byte_block()?;
                let old_bytes = reader.read_byte_block()?;
                Ok(PendingAction::BytesReplace {
                    parent_id,
                    index,
                    bytes,
                    old_bytes,
                })
            }
            action_tag::VECTOR_INSERT | action_tag::VECTOR_REMOVE => {
                let parent_id = reader.read_u64()?;
                let index = reader.read_len()?;
                let count = reader.read_len()?;
                let mut children = Vec::with_capacity(count);
                for _ in 0..count {
                    children.push(Node::read(reader)?);
                }
                Ok(if tag == action_tag::VECTOR_INSERT {
                    PendingAction::VectorInsert {
                        parent_id,
                        index,
                        children,
                    }
                } else {
                    PendingAction::VectorRemove {
                        parent_id,
                        index,
                        children,
                    }
                })
            }
            action_tag::VECTOR_MOVE => Ok(PendingAction::VectorMove {
                parent_id: reader.read_u64()?,
                index: reader.read_len()?,
                count: reader.read_len()?,
                dest: reader.read_len()?,
            }),
            action_tag::SHEET_INSERT | action_tag::SHEET_REMOVE => {
                let parent_id = reader.read_u64()?;
                let id = reader.read_i32()?;
                if id <= 0 {
                    return Err(StreamError::InvalidLength(id as i64));
                }
                let child = Node::read(reader)?;
                Ok(if tag == action_tag::SHEET_INSERT {
                    PendingAction::SheetInsert {
                        parent_id,
                        id: id as u32,
                        child,
                    }
                } else {
                    PendingAction::SheetRemove {
                        parent_id,
                        id: id as u32,
                        child,
                    }
                })
            }
            action_tag::MAPPING_ASSIGN => {
                let parent_id = reader.read_u64()?;
                let key = reader.read_string()?;
                let old_value = PendingProperty::read(reader)?;
                let value = PendingProperty::read(reader)?;
                Ok(PendingAction::MappingAssign {
                    parent_id,
                    key,
                    value,
                    old_value,
                })
            }
            action_tag::STRUCT_ASSIGN => {
                let parent_id = reader.read_u64()?;
                let index = reader.read_len()?;
                let old_value = PendingProperty::read(reader)?;
                let value = PendingProperty::read(reader)?;
                Ok(PendingAction::StructAssign {
                    parent_id,
                    index,
                    value,
                    old_value,
                })
            }
            tag if tag >= action_tag::USER_OFFSET => Ok(PendingAction::Custom(
                custom::read_custom_action(tag, reader)?,
            )),
            tag => Err(StreamError::InvalidTag(tag)),
        }
    }

    /// Turn placeholders into live node references via `find`; an
    /// unresolvable id fails the whole read.
    pub fn resolve(self, find: &dyn Fn(u64) -> Option<Node>) -> Result<Action> {
        let find_required = |id: u64| find(id).ok_or(StreamError::UnresolvedId(id));
        let find_optional = |id: u64| -> Result<Option<Node>> {
            if id == 0 {
                Ok(None)
            } else {
                find_required(id).map(Some)
            }
        };
        match self {
            PendingAction::RootChange { old_id, new_id } => Ok(Action::RootChange {
                old_root: find_optional(old_id)?,
                new_root: find_optional(new_id)?,
            }),
            PendingAction::BytesInsert {
                parent_id,
                index,
                bytes,
            } => Ok(Action::BytesInsert {
                parent: find_required(parent_id)?,
                index,
                bytes,
            }),
            PendingAction::BytesRemove {
                parent_id,
                index,
                bytes,
            } => Ok(Action::BytesRemove {
                parent: find_required(parent_id)?,
                index,
                bytes,
            }),
            PendingAction::BytesReplace {
                parent_id,
                index,
                bytes,
                old_bytes,
            } => Ok(Action::BytesReplace {
                parent: find_required(parent_id)?,
                index,
                bytes,
                old_bytes,
            }),
            PendingAction::VectorInsert {
                parent_id,
                index,
                children,
            } => Ok(Action::VectorInsert {
                parent: find_required(parent_id)?,
                index,
                children,
            }),
            PendingAction::VectorRemove {
                parent_id,
                index,
                children,
            } => Ok(Action::VectorRemove {
                parent: find_required(parent_id)?,
                index,
                children,
            }),
            PendingAction::VectorMove {
                parent_id,
                index,
                count,
                dest,
            } => Ok(Action::VectorMove {
                parent: find_required(parent_id)?,
                index,
                count,
                dest,
            }),
            PendingAction::SheetInsert {
                parent_id,
                id,
                child,
            } => Ok(Action::SheetInsert {
                parent: find_required(parent_id)?,
                id,
                child,
            }),
            PendingAction::SheetRemove {
                parent_id,
                id,
                child,
            } => Ok(Action::SheetRemove {
                parent: find_required(parent_id)?,
                id,
                child,
            }),
            PendingAction::MappingAssign {
                parent_id,
                key,
                value,
                old_value,
            } => Ok(Action::MappingAssign {
                parent: find_required(parent_id)?,
                key,
                value: value.resolve(find)?,
                old_value: old_value.resolve(find)?,
            }),
            PendingAction::StructAssign {
                parent_id,
                index,
                value,
                old_value,
            } => Ok(Action::StructAssign {
                parent: find_required(parent_id)?,
                index,
                value: value.resolve(find)?,
                old_value: old_value.resolve(find)?,
            }),
            PendingAction::Custom(mut custom) => {
                custom.resolve(&|id| find(id))?;
                Ok(Action::Custom(custom))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{BytesNode, VectorNode};

    #[test]
    fn test_insert_then_undo_is_identity() {
        let vector = VectorNode::new();
        vector.append(BytesNode::with_data(b"A").into_node());

        let child = BytesNode::with_data(b"B").into_node();
        let action = vector::insert_in_tx(vector.node(), 1, vec![child]);
        assert_eq!(vector.len(), 2);

        action.execute(true);
        assert_eq!(vector.len(), 1);

        action.execute(false);
        assert_eq!(vector.len(), 2);
    }

    #[test]
    fn test_move_undo_restores_order() {
        let vector = VectorNode::new();
        for label in [b"A", b"B", b"C", b"D", b"E"] {
            vector.append(BytesNode::with_data(label).into_node());
        }
        let action = vector::move_in_tx(vector.node(), 1, 2, 4);
        action.execute(true);
        let labels: Vec<Vec<u8>> = vector
            .nodes()
            .iter()
            .map(|n| n.as_bytes().unwrap().data())
            .collect();
        let expected: Vec<Vec<u8>> = [b"A", b"B", b"C", b"D", b"E"]
            .iter()
            .map(|b| b.to_vec())
            .collect();
        assert_eq!(labels, expected);
    }

    #[test]
    fn test_detached_clone_preserves_ids() {
        let child = BytesNode::with_data(b"payload").into_node();
        child.set_id(42);
        let vector = VectorNode::new();
        let action = vector::insert_in_tx(vector.node(), 0, vec![child.clone()]);

        let detached = action.detached();
        match &detached {
            Action::VectorInsert { children, .. } => {
                assert_eq!(children.len(), 1);
                assert_eq!(children[0].id(), 42);
                assert!(!children[0].ptr_eq(&child));
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_wire_roundtrip_with_resolution() {
        let parent = BytesNode::with_data(b"hay").into_node();
        parent.set_id(7);
        let action = Action::BytesInsert {
            parent: parent.clone(),
            index: 1,
            bytes: b"stack".to_vec(),
        };

        let mut buf = Vec::new();
        {
            let mut w = StreamWriter::new(&mut buf);
            action.write(&mut w).unwrap();
        }

        let mut cursor = &buf[..];
        let mut r = StreamReader::new(&mut cursor);
        let pending = PendingAction::read(&mut r).unwrap();
        let resolved = pending
            .resolve(&|id| (id == 7).then(|| parent.clone()))
            .unwrap();
        match resolved {
            Action::BytesInsert {
                parent: p,
                index,
                bytes,
            } => {
                assert!(p.ptr_eq(&parent));
                assert_eq!(index, 1);
                assert_eq!(bytes, b"stack");
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_unresolved_reference_fails() {
        let parent = BytesNode::new().into_node();
        parent.set_id(9);
        let action = Action::BytesInsert {
            parent,
            index: 0,
            bytes: b"x".to_vec(),
        };

        let mut buf = Vec::new();
        {
            let mut w = StreamWriter::new(&mut buf);
            action.write(&mut w).unwrap();
        }
        let mut cursor = &buf[..];
        let mut r = StreamReader::new(&mut cursor);
        let pending = PendingAction::read(&mut r).unwrap();
        assert!(matches!(
            pending.resolve(&|_| None),
            Err(StreamError::UnresolvedId(9))
        ));
    }
}
