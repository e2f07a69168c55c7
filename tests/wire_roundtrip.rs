//! Wire-format round trips for nodes, properties and actions

use chronicle::model::{
    BytesNode, MappingNode, MemoryEngine, Model, Node, NodeType, Property, SheetNode, StepMessage,
    StructNode, VectorNode,
};
use chronicle::stream::{StreamReader, StreamWriter};
use chronicle::variant::Variant;

fn write_node(node: &Node) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut w = StreamWriter::new(&mut buf);
        node.write(&mut w).unwrap();
    }
    buf
}

fn read_node(buf: &[u8]) -> Node {
    let mut cursor = buf;
    let mut r = StreamReader::new(&mut cursor);
    Node::read(&mut r).unwrap()
}

/// Serialize a model's root (empty marker when unset), ids included.
fn snapshot(model: &Model) -> Vec<u8> {
    match model.root() {
        Some(root) => write_node(&root),
        None => Vec::new(),
    }
}

fn build_document() -> Node {
    let root = MappingNode::new();
    root.set("title", Variant::from("chronicle").into());
    root.set("revision", Variant::from(7u32).into());

    let text = BytesNode::with_data(b"body text");
    root.set("body", text.node().clone().into());

    let list = VectorNode::new();
    list.append(BytesNode::with_data(b"first").into_node());
    list.append(BytesNode::with_data(b"second").into_node());
    root.set("list", list.node().clone().into());

    let sheet = SheetNode::new();
    sheet.insert(BytesNode::with_data(b"row 1").into_node());
    sheet.insert(BytesNode::with_data(b"row 2").into_node());
    sheet.remove(1);
    root.set("rows", sheet.node().clone().into());

    let tuple = StructNode::new(2);
    tuple.assign(0, Variant::from(true).into());
    tuple.assign(1, BytesNode::with_data(b"slot").into_node().into());
    root.set("tuple", tuple.node().clone().into());

    root.into_node()
}

#[test]
fn e2e_document_roundtrip() {
    let original = build_document();
    let bytes = write_node(&original);
    let decoded = read_node(&bytes);

    // Round-tripping the decoded tree yields identical bytes.
    assert_eq!(write_node(&decoded), bytes);
    assert_eq!(decoded.node_type(), NodeType::Mapping);

    let mapping = decoded.as_mapping().unwrap();
    assert_eq!(
        mapping.get("title").variant().unwrap().as_str(),
        Some("chronicle")
    );
    let list = mapping.get("list").node().unwrap().as_vector().unwrap();
    assert_eq!(list.len(), 2);
    let rows = mapping.get("rows").node().unwrap().as_sheet().unwrap();
    assert_eq!(rows.ids(), vec![2]);
    assert_eq!(rows.max_id(), 2);
    let tuple = mapping.get("tuple").node().unwrap().as_struct().unwrap();
    assert_eq!(tuple.arity(), 2);
    assert_eq!(tuple.get(0).variant().unwrap().as_bool(), Some(true));
    assert!(tuple.get(1).is_node());
}

#[test]
fn e2e_roundtrip_preserves_ids() {
    let model = Model::new(Box::new(MemoryEngine::new()));
    let root = build_document();
    model.begin_transaction();
    model.set_root(Some(root.clone()));
    model.commit_transaction(StepMessage::new());
    assert!(root.id() > 0);

    let decoded = read_node(&write_node(&root));
    assert_eq!(decoded.id(), root.id());

    // Every node in the decoded tree keeps the id of its original.
    let mut original_ids = Vec::new();
    root.propagate(&mut |n| original_ids.push(n.id()));
    let mut decoded_ids = Vec::new();
    decoded.propagate(&mut |n| decoded_ids.push(n.id()));
    assert_eq!(original_ids, decoded_ids);
    assert!(original_ids.iter().all(|id| *id > 0));

    // The decoded tree is free and structurally independent.
    assert!(decoded.is_free());
    assert!(decoded.model().is_none());
}

#[test]
fn e2e_undo_redo_involution_is_bit_exact() {
    let model = Model::new(Box::new(MemoryEngine::new()));
    let text = BytesNode::with_data(b"state");

    model.begin_transaction();
    model.set_root(Some(text.node().clone()));
    model.commit_transaction(StepMessage::new());

    model.begin_transaction();
    text.append(b" v2");
    text.replace(0, b"S");
    model.commit_transaction(StepMessage::new());

    let after = snapshot(&model);
    model.undo();
    let before = snapshot(&model);

    model.redo();
    assert_eq!(snapshot(&model), after);

    model.undo();
    assert_eq!(snapshot(&model), before);
}

#[test]
fn e2e_abort_is_identity_on_the_wire() {
    let model = Model::new(Box::new(MemoryEngine::new()));
    let root = build_document();
    model.begin_transaction();
    model.set_root(Some(root.clone()));
    model.commit_transaction(StepMessage::new());

    let before = snapshot(&model);

    model.begin_transaction();
    let mapping = root.as_mapping().unwrap();
    mapping.set("title", Variant::from("scratch").into());
    mapping.set("extra", Variant::from(1i64).into());
    mapping
        .get("body")
        .node()
        .unwrap()
        .as_bytes()
        .unwrap()
        .append(b"!!");
    model.abort_transaction();

    assert_eq!(snapshot(&model), before);
}

#[test]
fn e2e_empty_commit_is_identity() {
    let model = Model::new(Box::new(MemoryEngine::new()));
    let root = build_document();
    model.begin_transaction();
    model.set_root(Some(root));
    model.commit_transaction(StepMessage::new());

    let before = snapshot(&model);
    let (min, cur, max) = (
        model.minimum_step(),
        model.current_step(),
        model.maximum_step(),
    );

    model.begin_transaction();
    model.commit_transaction(StepMessage::new());

    assert_eq!(snapshot(&model), before);
    assert_eq!(
        (
            model.minimum_step(),
            model.current_step(),
            model.maximum_step()
        ),
        (min, cur, max)
    );
}

#[test]
fn e2e_property_wire_forms() {
    // Inline form embeds the node subtree.
    let child = BytesNode::with_data(b"embedded").into_node();
    let prop = Property::Node(child);
    let mut buf = Vec::new();
    {
        let mut w = StreamWriter::new(&mut buf);
        prop.write_inline(&mut w).unwrap();
    }
    let mut cursor = &buf[..];
    let mut r = StreamReader::new(&mut cursor);
    let decoded = Property::read_inline(&mut r).unwrap();
    assert_eq!(
        decoded.node().unwrap().as_bytes().unwrap().data(),
        b"embedded".to_vec()
    );

    // Variant and empty branches survive unchanged.
    for prop in [
        Property::Empty,
        Property::Variant(Variant::from(-12i16)),
        Property::Variant(Variant::from("hello")),
    ] {
        let mut buf = Vec::new();
        {
            let mut w = StreamWriter::new(&mut buf);
            prop.write_inline(&mut w).unwrap();
        }
        let mut cursor = &buf[..];
        let mut r = StreamReader::new(&mut cursor);
        assert_eq!(Property::read_inline(&mut r).unwrap(), prop);
    }
}

#[test]
fn e2e_truncated_document_fails_cleanly() {
    let bytes = write_node(&build_document());
    for cut in [1, 5, bytes.len() / 2, bytes.len() - 1] {
        let mut cursor = &bytes[..cut];
        let mut r = StreamReader::new(&mut cursor);
        assert!(Node::read(&mut r).is_err(), "cut at {} should fail", cut);
    }
}
