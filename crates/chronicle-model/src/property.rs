//! Property: the value cell held by mapping and struct nodes

use chronicle_stream::{Result, StreamError, StreamReader, StreamWriter};
use chronicle_variant::Variant;

use crate::node::Node;

/// Wire tags for property records.
pub(crate) mod prop_tag {
    pub const EMPTY: i32 = 0;
    pub const NODE_REF: i32 = 1;
    pub const VARIANT: i32 = 2;
}

/// A value cell: empty, an opaque variant value, or a reference to a
/// child node.
///
/// Two properties compare equal iff they hold the same branch and, for
/// the variant branch, equal variants; node branches compare by node
/// identity, not structure.
#[derive(Debug, Clone, Default)]
pub enum Property {
    #[default]
    Empty,
    Variant(Variant),
    Node(Node),
}

impl Property {
    pub fn is_valid(&self) -> bool {
        !matches!(self, Property::Empty)
    }

    pub fn is_variant(&self) -> bool {
        matches!(self, Property::Variant(_))
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Property::Node(_))
    }

    pub fn variant(&self) -> Option<&Variant> {
        match self {
            Property::Variant(v) => Some(v),
            _ => None,
        }
    }

    pub fn node(&self) -> Option<&Node> {
        match self {
            Property::Node(n) => Some(n),
            _ => None,
        }
    }

    /// Serialize with child subtrees embedded; used inside node records.
    pub fn write_inline(&self, out: &mut StreamWriter<'_>) -> Result<()> {
        match self {
            Property::Empty => out.write_i32(prop_tag::EMPTY),
            Property::Node(node) => {
                out.write_i32(prop_tag::NODE_REF)?;
                node.write(out)
            }
            Property::Variant(variant) => {
                out.write_i32(prop_tag::VARIANT)?;
                variant.write(out)
            }
        }
    }

    /// Counterpart of [`write_inline`](Property::write_inline); node
    /// branches come back as free subtrees with their ids preserved.
    pub fn read_inline(reader: &mut StreamReader<'_>) -> Result<Property> {
        let tag = reader.read_i32()?;
        match tag {
            prop_tag::EMPTY => Ok(Property::Empty),
            prop_tag::NODE_REF => Ok(Property::Node(Node::read(reader)?)),
            prop_tag::VARIANT => Ok(Property::Variant(Variant::read(reader)?)),
            tag => Err(StreamError::InvalidTag(tag)),
        }
    }

    /// Serialize with child nodes referenced by id; used inside action
    /// records, where the subtree already lives in the log.
    pub fn write_ref(&self, out: &mut StreamWriter<'_>) -> Result<()> {
        match self {
            Property::Empty => out.write_i32(prop_tag::EMPTY),
            Property::Node(node) => {
                out.write_i32(prop_tag::NODE_REF)?;
                out.write_u64(node.id())
            }
            Property::Variant(variant) => {
                out.write_i32(prop_tag::VARIANT)?;
                variant.write(out)
            }
        }
    }
}

impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Property::Empty, Property::Empty) => true,
            (Property::Variant(a), Property::Variant(b)) => a == b,
            (Property::Node(a), Property::Node(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<Variant> for Property {
    fn from(v: Variant) -> Self {
        Property::Variant(v)
    }
}

impl From<Node> for Property {
    fn from(n: Node) -> Self {
        Property::Node(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::BytesNode;

    #[test]
    fn test_equality_branches() {
        assert_eq!(Property::Empty, Property::Empty);
        assert_eq!(
            Property::from(Variant::from(1i32)),
            Property::from(Variant::from(1i32))
        );
        assert_ne!(
            Property::from(Variant::from(1i32)),
            Property::from(Variant::from(2i32))
        );
        assert_ne!(Property::Empty, Property::from(Variant::from(1i32)));
    }

    #[test]
    fn test_node_equality_is_identity() {
        let a = BytesNode::new();
        let b = BytesNode::new();
        let a1 = Property::from(a.node().clone());
        let a2 = Property::from(a.node().clone());
        let b1 = Property::from(b.node().clone());
        assert_eq!(a1, a2);
        assert_ne!(a1, b1);
    }

    #[test]
    fn test_default_is_empty() {
        assert!(!Property::default().is_valid());
    }
}
