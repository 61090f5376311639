//! Traces, their stages and the links between them.

use super::operation::{MergePoint, Op};
use crate::utils::config::{ASM_STAGE, BRIDGE_TYPE};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Render an id the way the front end addresses traces (`0x1f`)
pub fn hex_id(id: u64) -> String {
    format!("{:#x}", id)
}

/// Accepts `null`, a pair of addresses, or the `(-1, -1)` "unset" marker
fn addrs_or_unset<'de, D>(deserializer: D) -> Result<Option<(u64, u64)>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<(i64, i64)>::deserialize(deserializer)?;
    Ok(match raw {
        Some((start, end)) if start >= 0 && end >= 0 => Some((start as u64, end as u64)),
        _ => None,
    })
}

/// A named compilation phase of a trace
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Stage {
    #[serde(default)]
    pub ops: Vec<Op>,
}

impl Stage {
    pub fn new(ops: Vec<Op>) -> Self {
        Self { ops }
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Debug merge points of this stage, in operation order
    pub fn merge_points(&self) -> impl Iterator<Item = &MergePoint> {
        self.ops.iter().filter_map(Op::as_merge_point)
    }
}

/// Edge from an operation of one trace to another trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Index of the originating operation, `None` for an entry edge
    #[serde(default)]
    pub origin: Option<u64>,

    /// Id of the trace execution continues in
    pub target: u64,
}

impl Link {
    pub fn entry(target: u64) -> Self {
        Self {
            origin: None,
            target,
        }
    }

    pub fn from_op(origin: u64, target: u64) -> Self {
        Self {
            origin: Some(origin),
            target,
        }
    }
}

/// A recorded and compiled execution path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub unique_id: u64,

    #[serde(rename = "type")]
    pub trace_type: String,

    #[serde(default)]
    pub jd_name: Option<String>,

    #[serde(default)]
    pub stamp: u64,

    /// Start and end address of the machine code, if assembled
    #[serde(default, deserialize_with = "addrs_or_unset")]
    pub addrs: Option<(u64, u64)>,

    #[serde(default)]
    pub inputargs: Vec<String>,

    #[serde(default)]
    pub stages: BTreeMap<String, Stage>,

    #[serde(default)]
    pub links: Vec<Link>,

    /// Enter counts keyed by counter point index
    #[serde(default)]
    pub counter_points: BTreeMap<u64, u64>,

    /// Id of the trace this one was attached to
    #[serde(default)]
    pub parent: Option<u64>,
}

impl Trace {
    pub fn new(unique_id: u64, trace_type: impl Into<String>) -> Self {
        Self {
            unique_id,
            trace_type: trace_type.into(),
            jd_name: None,
            stamp: 0,
            addrs: None,
            inputargs: Vec::new(),
            stages: BTreeMap::new(),
            links: Vec::new(),
            counter_points: BTreeMap::new(),
            parent: None,
        }
    }

    pub fn with_stage(mut self, name: impl Into<String>, stage: Stage) -> Self {
        self.stages.insert(name.into(), stage);
        self
    }

    pub fn with_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    pub fn with_parent(mut self, parent: u64) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_addrs(mut self, start: u64, end: u64) -> Self {
        self.addrs = Some((start, end));
        self
    }

    pub fn hex_id(&self) -> String {
        hex_id(self.unique_id)
    }

    pub fn get_stage(&self, name: &str) -> Option<&Stage> {
        self.stages.get(name)
    }

    pub fn is_assembled(&self) -> bool {
        self.stages.contains_key(ASM_STAGE)
    }

    pub fn is_bridge(&self) -> bool {
        self.trace_type == BRIDGE_TYPE
    }

    /// First merge point found when walking the stages in order
    pub fn first_merge_point(&self) -> Option<&MergePoint> {
        self.stages
            .values()
            .find_map(|stage| stage.merge_points().next())
    }
}
