use pretty_assertions::assert_eq;
use serde_json::json;
use vmlog_studio::forest::{Op, Operation, Stage, Trace, TraceForest};
use vmlog_studio::serializer::serialize_stitches;

const A: u64 = 0xa0;
const B: u64 = 0xb0;

fn guard(index: u64, descr: u64) -> Op {
    Op::Plain(Operation::new(8, "guard_true", index).with_descr_number(descr))
}

fn finish(index: u64, descr: u64) -> Op {
    Op::Plain(Operation::new(9, "finish", index).with_descr_number(descr))
}

fn asm_trace(id: u64, ops: Vec<Op>) -> Trace {
    Trace::new(id, "loop").with_stage("asm", Stage::new(ops))
}

#[test]
fn test_root_without_asm_stage() {
    let mut forest = TraceForest::new(8, "x86_64");
    forest.add_trace(Trace::new(A, "loop"));

    let root = forest.get_trace_by_id(A).unwrap();
    let value = serde_json::to_value(serialize_stitches(&forest, root)).unwrap();

    assert_eq!(value, json!({ "root": "0xa0", "stitches": {} }));
}

#[test]
fn test_guard_stitched_to_existing_trace() {
    let mut forest = TraceForest::new(8, "x86_64");
    forest.add_trace(asm_trace(A, vec![guard(0, 5)]));
    forest.add_trace(asm_trace(B, vec![finish(0, 7)]));
    forest.add_stitch(5, B);

    let root = forest.get_trace_by_id(A).unwrap();
    let value = serde_json::to_value(serialize_stitches(&forest, root)).unwrap();

    assert_eq!(
        value,
        json!({
            "root": "0xa0",
            "stitches": {
                "0xa0": ["g,0,0x5,0xb0"],
                "0xb0": ["f,0,0x7"]
            }
        })
    );
}

#[test]
fn test_guard_stitched_to_missing_trace() {
    let mut forest = TraceForest::new(8, "x86_64");
    forest.add_trace(asm_trace(A, vec![guard(0, 5)]));
    forest.add_stitch(5, B);

    let root = forest.get_trace_by_id(A).unwrap();
    let graph = serialize_stitches(&forest, root);

    assert_eq!(graph.stitches["0xa0"], vec!["g,0,0x5,0x0".to_string()]);
    assert_eq!(graph.errors.len(), 1);
    assert!(graph.errors[0].contains("0x5"), "{}", graph.errors[0]);
    assert!(graph.errors[0].contains("0xb0"), "{}", graph.errors[0]);
}

#[test]
fn test_unregistered_guard_has_no_error() {
    let mut forest = TraceForest::new(8, "x86_64");
    forest.add_trace(asm_trace(A, vec![guard(0, 5)]));

    let root = forest.get_trace_by_id(A).unwrap();
    let value = serde_json::to_value(serialize_stitches(&forest, root)).unwrap();

    assert_eq!(
        value,
        json!({ "root": "0xa0", "stitches": { "0xa0": ["g,0,0x5,0x0"] } })
    );
}

#[test]
fn test_cyclic_stitches_terminate() {
    let mut forest = TraceForest::new(8, "x86_64");
    forest.add_trace(asm_trace(A, vec![guard(0, 1), guard(1, 1)]));
    forest.add_trace(asm_trace(B, vec![guard(0, 2)]));
    forest.add_stitch(1, B);
    forest.add_stitch(2, A);

    let root = forest.get_trace_by_id(A).unwrap();
    let graph = serialize_stitches(&forest, root);

    assert_eq!(graph.stitches.len(), 2);
    assert_eq!(
        graph.stitches["0xa0"],
        vec!["g,0,0x1,0xb0".to_string(), "g,1,0x1,0xb0".to_string()]
    );
    assert_eq!(graph.stitches["0xb0"], vec!["g,0,0x2,0xa0".to_string()]);
    assert!(graph.errors.is_empty());
}

#[test]
fn test_reachable_trace_without_asm_is_skipped() {
    let mut forest = TraceForest::new(8, "x86_64");
    forest.add_trace(asm_trace(A, vec![guard(0, 5)]));
    forest.add_trace(Trace::new(B, "bridge"));
    forest.add_stitch(5, B);

    let root = forest.get_trace_by_id(A).unwrap();
    let graph = serialize_stitches(&forest, root);

    assert_eq!(graph.stitches["0xa0"], vec!["g,0,0x5,0xb0".to_string()]);
    assert!(!graph.stitches.contains_key("0xb0"));
    assert!(graph.errors.is_empty());
}

#[test]
fn test_guard_stitched_to_zero_is_unresolved() {
    let mut forest = TraceForest::new(8, "x86_64");
    forest.add_trace(asm_trace(A, vec![guard(0, 5)]));
    forest.add_stitch(5, 0);

    let root = forest.get_trace_by_id(A).unwrap();
    let value = serde_json::to_value(serialize_stitches(&forest, root)).unwrap();

    assert_eq!(
        value,
        json!({ "root": "0xa0", "stitches": { "0xa0": ["g,0,0x5,0x0"] } })
    );
}
