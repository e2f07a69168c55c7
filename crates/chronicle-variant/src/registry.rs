//! Process-wide registry for user-defined variant payloads

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chronicle_stream::{Result, StreamError, StreamReader};
use lazy_static::lazy_static;

use crate::{UserValue, USER_TYPE_OFFSET};

/// Deserializer for one registered user type.
pub type ReadFn = fn(&mut StreamReader<'_>) -> Result<Arc<dyn UserValue>>;

lazy_static! {
    static ref HANDLERS: RwLock<HashMap<i32, ReadFn>> = RwLock::new(HashMap::new());
}

/// Register a deserializer for `type_id`.
///
/// Returns `false` when the id is below [`USER_TYPE_OFFSET`] or already
/// taken. Registration and lookup are safe to call from any thread.
pub fn register_user_type(type_id: i32, read: ReadFn) -> bool {
    if type_id < USER_TYPE_OFFSET {
        return false;
    }
    let mut handlers = HANDLERS.write().unwrap();
    if handlers.contains_key(&type_id) {
        return false;
    }
    handlers.insert(type_id, read);
    true
}

pub fn is_registered(type_id: i32) -> bool {
    HANDLERS.read().unwrap().contains_key(&type_id)
}

/// Dispatch a payload read to the registered handler.
pub(crate) fn read_user_payload(
    type_id: i32,
    reader: &mut StreamReader<'_>,
) -> Result<Arc<dyn UserValue>> {
    let read = {
        let handlers = HANDLERS.read().unwrap();
        match handlers.get(&type_id) {
            Some(read) => *read,
            None => return Err(StreamError::UnknownType(type_id)),
        }
    };
    read(reader)
}
