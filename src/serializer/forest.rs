//! Forest overview: one metadata record per trace plus the link index.

use crate::forest::{hex_id, Trace, TraceForest};
use crate::utils::config::{UNKNOWN_LINENO, UNKNOWN_SCOPE};
use log::{debug, warn};
use serde::Serialize;
use std::collections::BTreeMap;

/// Origin index recorded for links that have no origin operation
pub const ENTRY_ORIGIN: u64 = 0;

/// Serialized forest overview
#[derive(Debug, Clone, Serialize)]
pub struct ForestMeta {
    pub resops: BTreeMap<u32, String>,

    /// Trace id -> metadata
    pub traces: BTreeMap<u64, TraceMeta>,

    /// Trace id -> (origin op index -> target trace id).
    /// Traces without links have no entry.
    pub links: BTreeMap<u64, BTreeMap<u64, u64>>,

    pub word_size: u32,
    pub machine: String,
}

/// Per-trace metadata shown in the trace list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceMeta {
    pub scope: String,
    pub lineno: i64,
    pub filename: String,

    #[serde(rename = "type")]
    pub trace_type: String,

    pub counter_points: BTreeMap<u64, u64>,

    /// Machine code range, assembled traces only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addr: Option<(u64, u64)>,

    pub jd_name: Option<String>,

    /// Hex id of the parent trace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    pub stamp: u64,
}

/// Serialize the overview of every trace in the forest
pub fn serialize_forest(forest: &TraceForest) -> ForestMeta {
    debug!("Serializing forest overview of {} traces", forest.trace_count());

    let mut traces = BTreeMap::new();
    let mut links = BTreeMap::new();

    for trace in forest.traces() {
        traces.insert(trace.unique_id, trace_meta(forest, trace));

        let index = link_index(trace);
        if !index.is_empty() {
            links.insert(trace.unique_id, index);
        }
    }

    ForestMeta {
        resops: forest.resops.clone(),
        traces,
        links,
        word_size: forest.word_size,
        machine: forest.machine.clone(),
    }
}

/// Build the metadata record of a single trace
pub fn trace_meta(forest: &TraceForest, trace: &Trace) -> TraceMeta {
    let mut meta = TraceMeta {
        scope: UNKNOWN_SCOPE.to_string(),
        lineno: UNKNOWN_LINENO,
        filename: String::new(),
        trace_type: trace.trace_type.clone(),
        counter_points: trace.counter_points.clone(),
        addr: None,
        jd_name: trace.jd_name.clone(),
        parent: None,
        stamp: trace.stamp,
    };

    if trace.is_assembled() {
        meta.addr = trace.addrs;
    }

    if let Some(mp) = trace.first_merge_point() {
        if let Some(scope) = mp.scope() {
            meta.scope = scope.to_string();
        }
        if let Some(lineno) = mp.lineno() {
            meta.lineno = lineno;
        }
        if let Some(filename) = mp.filename() {
            meta.filename = filename.to_string();
        }
    }

    if let Some(parent_id) = trace.parent {
        match forest.get_parent(trace) {
            Some(parent) => meta.parent = Some(parent.hex_id()),
            None => warn!(
                "Trace {} refers to unknown parent {}",
                trace.hex_id(),
                hex_id(parent_id)
            ),
        }
    }

    meta
}

/// Map origin operation index to target trace id; entry edges use index 0
///
/// A link from the operation at index 0 shares its key with the entry edge.
/// The later link in the trace wins.
fn link_index(trace: &Trace) -> BTreeMap<u64, u64> {
    let mut index = BTreeMap::new();
    for link in &trace.links {
        let origin = link.origin.unwrap_or(ENTRY_ORIGIN);
        if let Some(previous) = index.insert(origin, link.target) {
            debug!(
                "Trace {}: link to {} at index {} replaces link to {}",
                trace.hex_id(),
                hex_id(link.target),
                origin,
                hex_id(previous)
            );
        }
    }
    index
}
