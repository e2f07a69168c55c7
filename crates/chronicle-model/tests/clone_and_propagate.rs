//! Deep clone and traversal tests

use chronicle_model::{
    BytesNode, MappingNode, MemoryEngine, Model, NodeState, Property, SheetNode, StepMessage,
    StructNode, VectorNode,
};
use chronicle_variant::Variant;

fn build_tree() -> MappingNode {
    let root = MappingNode::new();
    root.set("name", Variant::from("tree").into());

    let list = VectorNode::new();
    list.append(BytesNode::with_data(b"v0").into_node());
    list.append(BytesNode::with_data(b"v1").into_node());
    root.set("list", list.node().clone().into());

    let sheet = SheetNode::new();
    sheet.insert(BytesNode::with_data(b"row").into_node());
    root.set("sheet", sheet.node().clone().into());

    let tuple = StructNode::new(2);
    tuple.assign(0, Variant::from(9i32).into());
    tuple.assign(1, BytesNode::with_data(b"slot").into_node().into());
    root.set("tuple", tuple.node().clone().into());

    root
}

#[test]
fn test_propagate_visits_every_node_once_preorder() {
    let root = build_tree();
    let mut visited = Vec::new();
    root.node().propagate(&mut |n| visited.push(n.clone()));

    // Root + list + 2 leaves + sheet + 1 row + tuple + 1 slot child.
    assert_eq!(visited.len(), 8);
    assert_eq!(visited[0], *root.node());
    for pair in visited.windows(2) {
        assert!(!pair[0].ptr_eq(&pair[1]));
    }
    // Pre-order: every visited node's parent appears before it.
    for node in &visited[1..] {
        let parent = node.parent().unwrap();
        let parent_pos = visited.iter().position(|n| n.ptr_eq(&parent)).unwrap();
        let node_pos = visited.iter().position(|n| n.ptr_eq(node)).unwrap();
        assert!(parent_pos < node_pos);
    }
}

#[test]
fn test_deep_clone_without_ids() {
    let model = Model::new(Box::new(MemoryEngine::new()));
    let root = build_tree();
    model.begin_transaction();
    model.set_root(Some(root.node().clone()));
    model.commit_transaction(StepMessage::new());

    let copy = root.node().deep_clone(false);
    assert!(copy.is_free());
    assert!(copy.model().is_none());
    copy.propagate(&mut |n| assert_eq!(n.id(), 0));

    // Structure matches the original.
    let copy_map = copy.as_mapping().unwrap();
    assert_eq!(copy_map.keys(), root.keys());
    let copy_list = copy_map.get("list").node().unwrap().as_vector().unwrap();
    assert_eq!(copy_list.len(), 2);
    assert_eq!(
        copy_list.get(0).unwrap().as_bytes().unwrap().data(),
        b"v0".to_vec()
    );
}

#[test]
fn test_deep_clone_with_ids() {
    let model = Model::new(Box::new(MemoryEngine::new()));
    let root = build_tree();
    model.begin_transaction();
    model.set_root(Some(root.node().clone()));
    model.commit_transaction(StepMessage::new());

    let copy = root.node().deep_clone(true);
    let mut original_ids = Vec::new();
    root.node().propagate(&mut |n| original_ids.push(n.id()));
    let mut copy_ids = Vec::new();
    copy.propagate(&mut |n| copy_ids.push(n.id()));
    assert_eq!(original_ids, copy_ids);
    assert!(copy_ids.iter().all(|id| *id > 0));

    // Same ids, distinct identities, no model.
    assert!(!copy.ptr_eq(root.node()));
    assert!(copy.model().is_none());
}

#[test]
fn test_clone_is_independent_of_the_original() {
    let root = build_tree();
    let copy = root.node().deep_clone(false).as_mapping().unwrap();

    copy.set("name", Variant::from("copy").into());
    copy.get("list")
        .node()
        .unwrap()
        .as_vector()
        .unwrap()
        .remove(0, 1);

    assert_eq!(root.get("name").variant().unwrap().as_str(), Some("tree"));
    assert_eq!(
        root.get("list").node().unwrap().as_vector().unwrap().len(),
        2
    );
    assert_eq!(copy.get("name").variant().unwrap().as_str(), Some("copy"));
}

#[test]
fn test_clone_preserves_sheet_high_water_mark() {
    let sheet = SheetNode::new();
    sheet.insert(BytesNode::new().into_node());
    sheet.insert(BytesNode::new().into_node());
    sheet.remove(2);
    assert_eq!(sheet.max_id(), 2);

    let copy = sheet.node().deep_clone(false).as_sheet().unwrap();
    assert_eq!(copy.ids(), vec![1]);
    assert_eq!(copy.max_id(), 2);
    // A fresh insert on the copy continues after the preserved mark.
    assert_eq!(copy.insert(BytesNode::new().into_node()), 3);
}

#[test]
fn test_clone_children_point_at_the_clone() {
    let root = build_tree();
    let copy = root.node().deep_clone(false);
    copy.propagate(&mut |n| {
        if let Some(parent) = n.parent() {
            // Walk up: every ancestor must be inside the copied tree,
            // which shares no identity with the original.
            assert!(!parent.ptr_eq(root.node()));
            assert_eq!(n.state(), NodeState::Active);
        }
    });
    assert_eq!(copy.state(), NodeState::Created);
}

#[test]
fn test_empty_property_slots_survive_clone() {
    let tuple = StructNode::new(3);
    tuple.assign(1, Variant::from(1u8).into());
    let copy = tuple.node().deep_clone(false).as_struct().unwrap();
    assert_eq!(copy.get(0), Property::Empty);
    assert!(copy.get(1).is_variant());
    assert_eq!(copy.get(2), Property::Empty);
}
