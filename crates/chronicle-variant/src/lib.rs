//! Chronicle variant values
//!
//! [`Variant`] is the opaque leaf value carried by mapping and struct
//! nodes: a fixed family of primitives plus an extension escape for
//! user-registered types. Variants are immutable once constructed; user
//! payloads are shared behind an `Arc` so copies are cheap.
//!
//! The wire format is `i32 type_id` followed by the payload; string and
//! alignment conventions come from `chronicle-stream`.

mod registry;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chronicle_stream::{Result, StreamError, StreamReader, StreamWriter};

pub use registry::{is_registered, register_user_type, ReadFn};

/// Fixed type ids for the primitive variant kinds.
pub mod type_id {
    pub const INVALID: i32 = 0;
    pub const BOOLEAN: i32 = 1;
    pub const BYTE: i32 = 2;
    pub const INT16: i32 = 3;
    pub const INT32: i32 = 4;
    pub const INT64: i32 = 5;
    pub const UBYTE: i32 = 6;
    pub const UINT16: i32 = 7;
    pub const UINT32: i32 = 8;
    pub const UINT64: i32 = 9;
    pub const SINGLE: i32 = 10;
    pub const DOUBLE: i32 = 11;
    pub const NULL: i32 = 12;
    pub const STRING: i32 = 13;
}

/// User-registered variant type ids start here.
pub const USER_TYPE_OFFSET: i32 = 1024;

/// Payload contract for user-registered variant types.
///
/// Implementations are immutable; equality goes through [`eq_value`]
/// (typically an `as_any` downcast against the same concrete type).
///
/// [`eq_value`]: UserValue::eq_value
pub trait UserValue: fmt::Debug + Send + Sync {
    fn write(&self, out: &mut StreamWriter<'_>) -> Result<()>;

    fn eq_value(&self, other: &dyn UserValue) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn is_null(&self) -> bool {
        false
    }
}

/// A user variant: registered type id plus shared payload.
#[derive(Debug, Clone)]
pub struct UserVariant {
    type_id: i32,
    value: Arc<dyn UserValue>,
}

impl UserVariant {
    pub fn new(type_id: i32, value: Arc<dyn UserValue>) -> Self {
        assert!(
            type_id >= USER_TYPE_OFFSET,
            "user variant type id {} is below the reserved offset",
            type_id
        );
        Self { type_id, value }
    }

    pub fn type_id(&self) -> i32 {
        self.type_id
    }

    pub fn value(&self) -> &Arc<dyn UserValue> {
        &self.value
    }
}

impl PartialEq for UserVariant {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.value.eq_value(other.value.as_ref())
    }
}

/// An opaque leaf value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Variant {
    /// No value at all; reads back as `Invalid`.
    #[default]
    Invalid,
    /// An explicit null, distinct from `Invalid`.
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    User(UserVariant),
}

impl Variant {
    pub fn type_id(&self) -> i32 {
        match self {
            Variant::Invalid => type_id::INVALID,
            Variant::Null => type_id::NULL,
            Variant::Bool(_) => type_id::BOOLEAN,
            Variant::I8(_) => type_id::BYTE,
            Variant::I16(_) => type_id::INT16,
            Variant::I32(_) => type_id::INT32,
            Variant::I64(_) => type_id::INT64,
            Variant::U8(_) => type_id::UBYTE,
            Variant::U16(_) => type_id::UINT16,
            Variant::U32(_) => type_id::UINT32,
            Variant::U64(_) => type_id::UINT64,
            Variant::F32(_) => type_id::SINGLE,
            Variant::F64(_) => type_id::DOUBLE,
            Variant::String(_) => type_id::STRING,
            Variant::User(u) => u.type_id(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Variant::Invalid)
    }

    pub fn is_null(&self) -> bool {
        match self {
            Variant::Invalid | Variant::Null => true,
            Variant::User(u) => u.value().is_null(),
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variant::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Variant::I32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Variant::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Variant::U64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Variant::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&UserVariant> {
        match self {
            Variant::User(u) => Some(u),
            _ => None,
        }
    }

    /// Serialize as `i32 type_id` + payload.
    pub fn write(&self, out: &mut StreamWriter<'_>) -> Result<()> {
        out.write_i32(self.type_id())?;
        match self {
            Variant::Invalid | Variant::Null => Ok(()),
            Variant::Bool(v) => out.write_bool(*v),
            Variant::I8(v) => out.write_i8(*v),
            Variant::I16(v) => out.write_i16(*v),
            Variant::I32(v) => out.write_i32(*v),
            Variant::I64(v) => out.write_i64(*v),
            Variant::U8(v) => out.write_u8(*v),
            Variant::U16(v) => out.write_u16(*v),
            Variant::U32(v) => out.write_u32(*v),
            Variant::U64(v) => out.write_u64(*v),
            Variant::F32(v) => out.write_f32(*v),
            Variant::F64(v) => out.write_f64(*v),
            Variant::String(s) => out.write_string(s),
            Variant::User(u) => u.value().write(out),
        }
    }

    /// Deserialize a variant record. Unknown user type ids fail the read.
    pub fn read(reader: &mut StreamReader<'_>) -> Result<Variant> {
        let tid = reader.read_i32()?;
        let variant = match tid {
            type_id::INVALID => Variant::Invalid,
            type_id::NULL => Variant::Null,
            type_id::BOOLEAN => Variant::Bool(reader.read_bool()?),
            type_id::BYTE => Variant::I8(reader.read_i8()?),
            type_id::INT16 => Variant::I16(reader.read_i16()?),
            type_id::INT32 => Variant::I32(reader.read_i32()?),
            type_id::INT64 => Variant::I64(reader.read_i64()?),
            type_id::UBYTE => Variant::U8(reader.read_u8()?),
            type_id::UINT16 => Variant::U16(reader.read_u16()?),
            type_id::UINT32 => Variant::U32(reader.read_u32()?),
            type_id::UINT64 => Variant::U64(reader.read_u64()?),
            type_id::SINGLE => Variant::F32(reader.read_f32()?),
            type_id::DOUBLE => Variant::F64(reader.read_f64()?),
            type_id::STRING => Variant::String(reader.read_string()?),
            tid if tid >= USER_TYPE_OFFSET => {
                let value = registry::read_user_payload(tid, reader)?;
                Variant::User(UserVariant::new(tid, value))
            }
            tid => return Err(StreamError::UnknownType(tid)),
        };
        Ok(variant)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Invalid => write!(f, "<invalid>"),
            Variant::Null => write!(f, "null"),
            Variant::Bool(v) => write!(f, "{}", v),
            Variant::I8(v) => write!(f, "{}", v),
            Variant::I16(v) => write!(f, "{}", v),
            Variant::I32(v) => write!(f, "{}", v),
            Variant::I64(v) => write!(f, "{}", v),
            Variant::U8(v) => write!(f, "{}", v),
            Variant::U16(v) => write!(f, "{}", v),
            Variant::U32(v) => write!(f, "{}", v),
            Variant::U64(v) => write!(f, "{}", v),
            Variant::F32(v) => write!(f, "{}", v),
            Variant::F64(v) => write!(f, "{}", v),
            Variant::String(s) => write!(f, "{:?}", s),
            Variant::User(u) => write!(f, "<user:{}>", u.type_id()),
        }
    }
}

impl From<bool> for Variant {
    fn from(v: bool) -> Self {
        Variant::Bool(v)
    }
}

impl From<i8> for Variant {
    fn from(v: i8) -> Self {
        Variant::I8(v)
    }
}

impl From<i16> for Variant {
    fn from(v: i16) -> Self {
        Variant::I16(v)
    }
}

impl From<i32> for Variant {
    fn from(v: i32) -> Self {
        Variant::I32(v)
    }
}

impl From<i64> for Variant {
    fn from(v: i64) -> Self {
        Variant::I64(v)
    }
}

impl From<u8> for Variant {
    fn from(v: u8) -> Self {
        Variant::U8(v)
    }
}

impl From<u16> for Variant {
    fn from(v: u16) -> Self {
        Variant::U16(v)
    }
}

impl From<u32> for Variant {
    fn from(v: u32) -> Self {
        Variant::U32(v)
    }
}

impl From<u64> for Variant {
    fn from(v: u64) -> Self {
        Variant::U64(v)
    }
}

impl From<f32> for Variant {
    fn from(v: f32) -> Self {
        Variant::F32(v)
    }
}

impl From<f64> for Variant {
    fn from(v: f64) -> Self {
        Variant::F64(v)
    }
}

impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Variant::String(v.to_string())
    }
}

impl From<String> for Variant {
    fn from(v: String) -> Self {
        Variant::String(v)
    }
}
