//! Algebraic laws checked with quickcheck

use chronicle::model::{
    BytesNode, MappingNode, MemoryEngine, Model, SheetNode, StepMessage, VectorNode,
};
use chronicle::variant::Variant;
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;

fn build_vector(len: usize) -> VectorNode {
    let vector = VectorNode::new();
    for i in 0..len {
        vector.append(BytesNode::with_data(&[i as u8]).into_node());
    }
    vector
}

fn vector_fingerprint(vector: &VectorNode) -> Vec<u8> {
    vector
        .nodes()
        .iter()
        .map(|n| n.as_bytes().unwrap().data()[0])
        .collect()
}

/// For any valid `(i, k, d)`, a move followed by its computed inverse is
/// the identity permutation.
#[quickcheck]
fn prop_vector_move_roundtrip(len: u8, index: u8, count: u8, dest: u8) -> TestResult {
    let len = (len % 12) as usize;
    if len == 0 {
        return TestResult::discard();
    }
    let index = (index as usize) % len;
    let count = 1 + (count as usize) % (len - index);
    let dest = (dest as usize) % (len + 1);
    if dest >= index && dest < index + count {
        return TestResult::discard();
    }
    // Moving a block to just past itself is the identity; its inverse
    // lands inside the moved range, which the public API rejects. The
    // replay path covers that shape; skip it here.
    if dest == index + count {
        return TestResult::discard();
    }

    let vector = build_vector(len);
    let before = vector_fingerprint(&vector);

    vector.move_range(index, count, dest);

    // Inverse pair: where the block now starts, and where it was.
    let (r_index, r_dest) = if dest > index {
        (dest - count, index)
    } else {
        (dest, index + count)
    };
    vector.move_range(r_index, count, r_dest);

    TestResult::from_bool(vector_fingerprint(&vector) == before)
}

/// `insert(i, b)` then `remove(i, b.len())` leaves the buffer unchanged.
#[quickcheck]
fn prop_bytes_insert_remove_identity(seed: Vec<u8>, index: u8, data: Vec<u8>) -> TestResult {
    if data.is_empty() {
        return TestResult::discard();
    }
    let index = (index as usize) % (seed.len() + 1);

    let bytes = BytesNode::with_data(&seed);
    bytes.insert(index, &data);
    bytes.remove(index, data.len());
    TestResult::from_bool(bytes.data() == seed)
}

/// An in-range replace never changes the buffer length.
#[quickcheck]
fn prop_bytes_replace_preserves_length(seed: Vec<u8>, index: u8, data: Vec<u8>) -> TestResult {
    if seed.is_empty() || data.is_empty() {
        return TestResult::discard();
    }
    let index = (index as usize) % seed.len();
    if index + data.len() > seed.len() {
        return TestResult::discard();
    }

    let bytes = BytesNode::with_data(&seed);
    bytes.replace(index, &data);
    TestResult::from_bool(bytes.len() == seed.len())
}

/// Undo followed by redo restores the exact byte content, whatever the
/// edit sequence was.
#[quickcheck]
fn prop_undo_redo_involution(edits: Vec<(bool, u8, Vec<u8>)>) -> TestResult {
    let model = Model::new(Box::new(MemoryEngine::new()));
    let text = BytesNode::new();
    model.begin_transaction();
    model.set_root(Some(text.node().clone()));
    model.commit_transaction(StepMessage::new());

    let mut steps = 0;
    for (is_insert, index, data) in edits.iter().take(8) {
        let len = text.len();
        model.begin_transaction();
        if *is_insert {
            if data.is_empty() {
                model.abort_transaction();
                continue;
            }
            text.insert((*index as usize) % (len + 1), data);
        } else {
            if len == 0 {
                model.abort_transaction();
                continue;
            }
            let at = (*index as usize) % len;
            text.remove(at, 1);
        }
        model.commit_transaction(StepMessage::new());
        steps += 1;
    }
    if steps == 0 {
        return TestResult::discard();
    }

    let after = text.data();
    for _ in 0..steps {
        model.undo();
    }
    assert!(text.is_empty());
    for _ in 0..steps {
        model.redo();
    }
    TestResult::from_bool(text.data() == after)
}

/// Assigning an equal value must not produce a step.
#[test]
fn law_assign_equality_short_circuit() {
    let model = Model::new(Box::new(MemoryEngine::new()));
    let mapping = MappingNode::new();
    model.begin_transaction();
    model.set_root(Some(mapping.node().clone()));
    mapping.set("k", Variant::from(5i32).into());
    model.commit_transaction(StepMessage::new());
    assert_eq!(model.maximum_step(), 1);

    model.begin_transaction();
    assert!(!mapping.set("k", Variant::from(5i32).into()));
    model.commit_transaction(StepMessage::new());

    // The transaction stayed empty: no step was written.
    assert_eq!(model.maximum_step(), 1);
    assert_eq!(model.current_step(), 1);
}

/// Consecutive sheet inserts yield strictly increasing ids regardless of
/// interleaved removals.
#[quickcheck]
fn prop_sheet_ids_strictly_increase(ops: Vec<bool>) -> bool {
    let sheet = SheetNode::new();
    let mut assigned = Vec::new();
    for insert in ops.iter().take(24) {
        if *insert || assigned.is_empty() {
            assigned.push(sheet.insert(BytesNode::new().into_node()));
        } else {
            let target = assigned[assigned.len() / 2];
            sheet.remove(target);
        }
    }
    assigned.windows(2).all(|w| w[0] < w[1])
}
