//! The forest of traces recorded for one program run.
//!
//! Traces are owned by the forest and reference each other only by
//! `unique_id`, so cyclic links never turn into ownership cycles.

use super::operation::{Op, Operation};
use super::trace::Trace;
use crate::utils::config::ASM_STAGE;
use crate::utils::error::InputError;
use log::debug;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// A line of source code as `(indent, text)`
pub type SourceLine = (u32, String);

/// All traces of a run plus the lookup tables shared between them
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "ForestDocument")]
pub struct TraceForest {
    /// Operation number to name table
    pub resops: BTreeMap<u32, String>,

    pub word_size: u32,

    pub machine: String,

    traces: BTreeMap<u64, Trace>,

    /// Guard descriptor number to the trace stitched onto it
    stitches: HashMap<u64, u64>,

    /// filename -> lineno -> line
    source: HashMap<String, BTreeMap<i64, SourceLine>>,
}

/// On-disk shape of a forest, validated into a [`TraceForest`]
#[derive(Deserialize)]
struct ForestDocument {
    #[serde(default)]
    resops: BTreeMap<u32, String>,

    #[serde(default)]
    word_size: u32,

    #[serde(default)]
    machine: String,

    #[serde(default)]
    traces: Vec<Trace>,

    #[serde(default)]
    stitches: HashMap<u64, u64>,

    #[serde(default)]
    source: HashMap<String, BTreeMap<i64, SourceLine>>,
}

impl TryFrom<ForestDocument> for TraceForest {
    type Error = InputError;

    fn try_from(doc: ForestDocument) -> Result<Self, Self::Error> {
        let mut forest = TraceForest::new(doc.word_size, doc.machine);
        forest.resops = doc.resops;
        forest.stitches = doc.stitches;
        forest.source = doc.source;

        for trace in doc.traces {
            let id = trace.unique_id;
            if forest.add_trace(trace).is_some() {
                return Err(InputError::Malformed(format!(
                    "duplicate trace id {:#x}",
                    id
                )));
            }
        }

        for trace in forest.traces.values() {
            if let Some(link) = trace.links.iter().find(|l| !forest.traces.contains_key(&l.target)) {
                return Err(InputError::Malformed(format!(
                    "trace {:#x} links to unknown trace {:#x}",
                    trace.unique_id, link.target
                )));
            }
        }

        debug!(
            "Loaded forest: {} traces, {} stitch targets, {} source files",
            forest.traces.len(),
            forest.stitches.len(),
            forest.source.len()
        );

        Ok(forest)
    }
}

impl TraceForest {
    pub fn new(word_size: u32, machine: impl Into<String>) -> Self {
        Self {
            word_size,
            machine: machine.into(),
            ..Default::default()
        }
    }

    /// Insert a trace, returning the one previously stored under its id
    pub fn add_trace(&mut self, trace: Trace) -> Option<Trace> {
        self.traces.insert(trace.unique_id, trace)
    }

    /// Record that a failing guard with `descr_number` continues in `trace_id`
    pub fn add_stitch(&mut self, descr_number: u64, trace_id: u64) {
        self.stitches.insert(descr_number, trace_id);
    }

    pub fn add_source_line(
        &mut self,
        filename: impl Into<String>,
        lineno: i64,
        indent: u32,
        text: impl Into<String>,
    ) {
        self.source
            .entry(filename.into())
            .or_default()
            .insert(lineno, (indent, text.into()));
    }

    /// Traces in id order
    pub fn traces(&self) -> impl Iterator<Item = &Trace> {
        self.traces.values()
    }

    pub fn trace_count(&self) -> usize {
        self.traces.len()
    }

    pub fn get_trace_by_id(&self, id: u64) -> Option<&Trace> {
        self.traces.get(&id)
    }

    pub fn get_stitch_target(&self, descr_number: u64) -> Option<u64> {
        self.stitches.get(&descr_number).copied()
    }

    /// Look up a source line, `None` when the file or line is unknown
    pub fn get_source_line(&self, filename: &str, lineno: i64) -> Option<(u32, &str)> {
        self.source
            .get(filename)?
            .get(&lineno)
            .map(|(indent, text)| (*indent, text.as_str()))
    }

    pub fn get_parent(&self, trace: &Trace) -> Option<&Trace> {
        trace.parent.and_then(|id| self.get_trace_by_id(id))
    }

    /// The guard in the parent trace whose failure enters `bridge`
    ///
    /// The parent's `asm` stage is searched first, then the remaining stages.
    pub fn get_failing_guard(&self, bridge: &Trace) -> Option<&Operation> {
        let parent = self.get_parent(bridge)?;
        let stages = parent
            .get_stage(ASM_STAGE)
            .into_iter()
            .chain(parent.stages.iter().filter(|(name, _)| name.as_str() != ASM_STAGE).map(|(_, s)| s));

        for stage in stages {
            for op in stage.ops() {
                let Op::Plain(guard) = op else {
                    continue;
                };
                if !guard.is_guard() {
                    continue;
                }
                let target = guard
                    .descr_number
                    .and_then(|descr| self.get_stitch_target(descr));
                if target == Some(bridge.unique_id) {
                    return Some(guard);
                }
            }
        }

        None
    }
}
