//! Nested serialization of a single trace: stages, source code, bridge info.

use super::operation::{serialize_merge_point, serialize_op, serialize_operation, OperationJson};
use crate::forest::{hex_id, SourceLine, Stage, Trace, TraceForest};
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

/// Serialized stage
#[derive(Debug, Clone, Serialize)]
pub struct StageJson {
    pub ops: Vec<OperationJson>,
    pub merge_points: Vec<OperationJson>,
}

/// Full detail of one trace
#[derive(Debug, Clone, Serialize)]
pub struct TraceDetail {
    pub args: Vec<String>,

    pub stages: BTreeMap<String, StageJson>,

    /// filename -> lineno -> (indent, text) for every resolvable merge point
    pub code: BTreeMap<String, BTreeMap<i64, SourceLine>>,

    /// Guard whose failure enters this bridge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failing_guard: Option<OperationJson>,

    /// Machine code range as hex strings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addr: Option<(String, String)>,
}

pub fn serialize_stage(stage: &Stage) -> StageJson {
    StageJson {
        ops: stage.ops().iter().map(serialize_op).collect(),
        merge_points: stage
            .merge_points()
            .map(|mp| OperationJson::MergePoint(serialize_merge_point(mp)))
            .collect(),
    }
}

/// Serialize one trace together with the source lines its merge points hit
pub fn serialize_trace(forest: &TraceForest, trace: &Trace) -> TraceDetail {
    debug!(
        "Serializing trace {} with {} stages",
        trace.hex_id(),
        trace.stages.len()
    );

    let mut stages = BTreeMap::new();
    let mut code: BTreeMap<String, BTreeMap<i64, SourceLine>> = BTreeMap::new();

    for (name, stage) in &trace.stages {
        stages.insert(name.clone(), serialize_stage(stage));

        for mp in stage.merge_points() {
            let (Some(filename), Some(lineno)) = (mp.filename(), mp.lineno()) else {
                continue;
            };
            if let Some((indent, text)) = forest.get_source_line(filename, lineno) {
                code.entry(filename.to_string())
                    .or_default()
                    .insert(lineno, (indent, text.to_string()));
            }
        }
    }

    let failing_guard = if trace.is_bridge() {
        forest
            .get_failing_guard(trace)
            .map(|guard| OperationJson::Plain(serialize_operation(guard)))
    } else {
        None
    };

    TraceDetail {
        args: trace.inputargs.clone(),
        stages,
        code,
        failing_guard,
        addr: trace.addrs.map(|(start, end)| (hex_id(start), hex_id(end))),
    }
}
