//! Tree rendering: indented text for the shell, JSON for `dump`

use std::fs;
use std::path::Path;

use chronicle_model::{Node, NodeType, Property};
use chronicle_stream::StreamReader;
use chronicle_variant::Variant;
use serde_json::{json, Value};

fn type_name(node: &Node) -> &'static str {
    match node.node_type() {
        NodeType::Bytes => "Bytes",
        NodeType::Vector => "Vector",
        NodeType::Mapping => "Mapping",
        NodeType::Sheet => "Sheet",
        NodeType::Struct => "Struct",
        NodeType::User(_) => "User",
    }
}

fn print_bytes(data: &[u8]) -> String {
    match std::str::from_utf8(data) {
        Ok(text) => format!("{:?}", text),
        Err(_) => format!("{} bytes", data.len()),
    }
}

/// Print one node and its subtree, indented, with a leading label.
pub fn print_node(label: &str, node: &Node, indent: usize) {
    let pad = " ".repeat(indent);
    let id = node.id();
    if label.is_empty() {
        println!("{}{} (id {})", pad, type_name(node), id);
    } else {
        println!("{}{} {} (id {})", pad, label, type_name(node), id);
    }

    match node.node_type() {
        NodeType::Bytes => {
            let bytes = node.as_bytes().unwrap();
            println!("{}  bytes: {}", pad, print_bytes(&bytes.data()));
        }
        NodeType::Vector => {
            let vector = node.as_vector().unwrap();
            for (i, child) in vector.nodes().iter().enumerate() {
                print_node(&i.to_string(), child, indent + 2);
            }
        }
        NodeType::Mapping => {
            let mapping = node.as_mapping().unwrap();
            for (key, prop) in mapping.entries() {
                match prop {
                    Property::Variant(v) => println!("{}  {} variant: {}", pad, key, v),
                    Property::Node(child) => print_node(&key, &child, indent + 2),
                    Property::Empty => {}
                }
            }
        }
        NodeType::Sheet => {
            let sheet = node.as_sheet().unwrap();
            for (id, child) in sheet.entries() {
                print_node(&id.to_string(), &child, indent + 2);
            }
        }
        NodeType::Struct => {
            let tuple = node.as_struct().unwrap();
            for (i, prop) in tuple.slots().iter().enumerate() {
                match prop {
                    Property::Variant(v) => println!("{}  {} variant: {}", pad, i, v),
                    Property::Node(child) => print_node(&i.to_string(), child, indent + 2),
                    Property::Empty => println!("{}  {} empty", pad, i),
                }
            }
        }
        NodeType::User(tag) => {
            println!("{}  user payload (tag {})", pad, tag);
        }
    }
}

fn variant_to_json(v: &Variant) -> Value {
    match v {
        Variant::Invalid => Value::Null,
        Variant::Null => Value::Null,
        Variant::Bool(b) => json!(b),
        Variant::I8(n) => json!(n),
        Variant::I16(n) => json!(n),
        Variant::I32(n) => json!(n),
        Variant::I64(n) => json!(n),
        Variant::U8(n) => json!(n),
        Variant::U16(n) => json!(n),
        Variant::U32(n) => json!(n),
        Variant::U64(n) => json!(n),
        Variant::F32(n) => json!(n),
        Variant::F64(n) => json!(n),
        Variant::String(s) => json!(s),
        Variant::User(u) => json!(format!("<user:{}>", u.type_id())),
    }
}

fn property_to_json(prop: &Property) -> Value {
    match prop {
        Property::Empty => Value::Null,
        Property::Variant(v) => variant_to_json(v),
        Property::Node(node) => node_to_json(node),
    }
}

/// Render a node tree as JSON for inspection.
pub fn node_to_json(node: &Node) -> Value {
    let body = match node.node_type() {
        NodeType::Bytes => {
            let data = node.as_bytes().unwrap().data();
            match String::from_utf8(data.clone()) {
                Ok(text) => json!(text),
                Err(_) => json!(data),
            }
        }
        NodeType::Vector => {
            let children: Vec<Value> = node
                .as_vector()
                .unwrap()
                .nodes()
                .iter()
                .map(node_to_json)
                .collect();
            json!(children)
        }
        NodeType::Mapping => {
            let mut map = serde_json::Map::new();
            for (key, prop) in node.as_mapping().unwrap().entries() {
                map.insert(key, property_to_json(&prop));
            }
            Value::Object(map)
        }
        NodeType::Sheet => {
            let sheet = node.as_sheet().unwrap();
            let mut map = serde_json::Map::new();
            for (id, child) in sheet.entries() {
                map.insert(id.to_string(), node_to_json(&child));
            }
            json!({ "max_id": sheet.max_id(), "rows": Value::Object(map) })
        }
        NodeType::Struct => {
            let slots: Vec<Value> = node
                .as_struct()
                .unwrap()
                .slots()
                .iter()
                .map(property_to_json)
                .collect();
            json!(slots)
        }
        NodeType::User(tag) => json!(format!("<user:{}>", tag)),
    };
    json!({
        "type": type_name(node),
        "id": node.id(),
        "value": body,
    })
}

pub fn cmd_dump(file: &Path, pretty: bool) {
    let data = match fs::read(file) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("Error reading file: {}", err);
            std::process::exit(1);
        }
    };

    let mut cursor = &data[..];
    let mut reader = StreamReader::new(&mut cursor);
    let node = match Node::read(&mut reader) {
        Ok(node) => node,
        Err(err) => {
            eprintln!("Error decoding document: {}", err);
            std::process::exit(1);
        }
    };

    let value = node_to_json(&node);
    let output = if pretty {
        serde_json::to_string_pretty(&value).unwrap()
    } else {
        serde_json::to_string(&value).unwrap()
    };
    println!("{}", output);
}
