//! Stitch graph: which trace a failing guard continues in.
//!
//! Starting at a root trace, the `asm` stage of every reachable trace is
//! scanned. Guards resolve their continuation through the forest's stitch
//! index and pull the target into the traversal; labels, jumps and finishes
//! are emitted as markers. Each entry is a comma-joined string:
//!
//! - guard: `g,<op position>,<descr hex>,<target hex>`
//! - label / jump / finish: `l|j|f,<op position>,<descr hex>`
//!
//! Stitch graphs may be cyclic; every trace is visited at most once.

use crate::forest::{hex_id, Op, Trace, TraceForest};
use crate::utils::config::{ASM_STAGE, NULL_TARGET};
use log::{debug, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Serialized stitch graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StitchGraph {
    /// Hex id of the trace the traversal started from
    pub root: String,

    /// Hex trace id -> entries in op order
    pub stitches: BTreeMap<String, Vec<String>>,

    /// Unresolvable stitch targets, reported instead of raised
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Kind of an operation that shows up in the stitch graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StitchTag {
    Guard,
    Label,
    Jump,
    Finish,
}

impl StitchTag {
    pub fn classify(op: &Op) -> Option<Self> {
        if op.is_guard() {
            return Some(StitchTag::Guard);
        }
        match op.opname() {
            "label" => Some(StitchTag::Label),
            "jump" => Some(StitchTag::Jump),
            "finish" => Some(StitchTag::Finish),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StitchTag::Guard => "g",
            StitchTag::Label => "l",
            StitchTag::Jump => "j",
            StitchTag::Finish => "f",
        }
    }
}

/// Walk the stitch graph reachable from `root`
pub fn serialize_stitches(forest: &TraceForest, root: &Trace) -> StitchGraph {
    let mut graph = StitchGraph {
        root: root.hex_id(),
        stitches: BTreeMap::new(),
        errors: Vec::new(),
    };

    let mut visited: HashSet<u64> = HashSet::new();
    let mut worklist: Vec<&Trace> = vec![root];

    while let Some(trace) = worklist.pop() {
        if !visited.insert(trace.unique_id) {
            continue;
        }
        let Some(stage) = trace.get_stage(ASM_STAGE) else {
            continue;
        };

        let mut entries = Vec::new();
        for (position, op) in stage.ops().iter().enumerate() {
            let Some(tag) = StitchTag::classify(op) else {
                continue;
            };
            let descr = hex_id(op.descr_number().unwrap_or(0));

            let entry = match tag {
                StitchTag::Guard => {
                    let target = resolve_target(forest, op, &mut worklist, &mut graph.errors);
                    format!("{},{},{},{}", tag.as_str(), position, descr, target)
                }
                _ => format!("{},{},{}", tag.as_str(), position, descr),
            };
            entries.push(entry);
        }

        graph.stitches.insert(trace.hex_id(), entries);
    }

    debug!(
        "Stitch graph from {}: {} traces, {} errors",
        graph.root,
        graph.stitches.len(),
        graph.errors.len()
    );

    graph
}

/// Hex id of the trace a guard continues in, enqueueing it for traversal
fn resolve_target<'a>(
    forest: &'a TraceForest,
    guard: &Op,
    worklist: &mut Vec<&'a Trace>,
    errors: &mut Vec<String>,
) -> String {
    let Some(descr_number) = guard.descr_number() else {
        return NULL_TARGET.to_string();
    };
    let Some(target_id) = forest
        .get_stitch_target(descr_number)
        .filter(|id| *id != 0)
    else {
        return NULL_TARGET.to_string();
    };

    match forest.get_trace_by_id(target_id) {
        Some(target) => {
            worklist.push(target);
            target.hex_id()
        }
        None => {
            let message = format!(
                "No '{}' stage of trace ({}) stitched to guard {}",
                ASM_STAGE,
                hex_id(target_id),
                hex_id(descr_number)
            );
            warn!("{}", message);
            errors.push(message);
            NULL_TARGET.to_string()
        }
    }
}
