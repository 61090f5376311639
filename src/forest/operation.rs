//! Operations recorded inside a trace stage.
//!
//! A stage interleaves two shapes of operation: plain resoperations and
//! debug merge points carrying source information. Both are kept in one
//! ordered list as the tagged [`Op`] variant.

use crate::utils::config::GUARD_PREFIX;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name a merge point reports when asked for its opname
pub const MERGE_POINT_OPNAME: &str = "debug_merge_point";

/// A single entry of a stage's operation list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Op {
    /// Regular resoperation
    #[serde(rename = "op")]
    Plain(Operation),

    /// Debug checkpoint with source information
    MergePoint(MergePoint),
}

impl Op {
    pub fn opname(&self) -> &str {
        match self {
            Op::Plain(op) => &op.opname,
            Op::MergePoint(_) => MERGE_POINT_OPNAME,
        }
    }

    /// Descriptor number, only plain operations carry one
    pub fn descr_number(&self) -> Option<u64> {
        match self {
            Op::Plain(op) => op.descr_number,
            Op::MergePoint(_) => None,
        }
    }

    pub fn is_guard(&self) -> bool {
        matches!(self, Op::Plain(op) if op.is_guard())
    }

    pub fn as_merge_point(&self) -> Option<&MergePoint> {
        match self {
            Op::MergePoint(mp) => Some(mp),
            Op::Plain(_) => None,
        }
    }
}

/// Raw machine code dumped for an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreDump {
    /// Address the code was emitted at
    pub addr: u64,

    /// Emitted bytes
    #[serde(default)]
    pub bytes: Vec<u8>,
}

/// A regular resoperation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub opnum: u32,
    pub opname: String,
    pub index: u64,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub result: Option<String>,

    #[serde(default)]
    pub descr: Option<String>,

    /// Number identifying the guard descriptor (guards only)
    #[serde(default)]
    pub descr_number: Option<u64>,

    #[serde(default)]
    pub core_dump: Option<CoreDump>,
}

impl Operation {
    pub fn new(opnum: u32, opname: impl Into<String>, index: u64) -> Self {
        Self {
            opnum,
            opname: opname.into(),
            index,
            args: Vec::new(),
            result: None,
            descr: None,
            descr_number: None,
            core_dump: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }

    pub fn with_descr(mut self, descr: impl Into<String>) -> Self {
        self.descr = Some(descr.into());
        self
    }

    pub fn with_descr_number(mut self, descr_number: u64) -> Self {
        self.descr_number = Some(descr_number);
        self
    }

    pub fn with_core_dump(mut self, addr: u64, bytes: Vec<u8>) -> Self {
        self.core_dump = Some(CoreDump { addr, bytes });
        self
    }

    pub fn is_guard(&self) -> bool {
        self.opname.starts_with(GUARD_PREFIX)
    }
}

/// Semantic type of a value attached to a merge point
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemType {
    Filename,
    Lineno,
    Index,
    Scope,
    Opcode,
}

impl SemType {
    /// Key used for this value in serialized merge points
    pub fn name(self) -> &'static str {
        match self {
            SemType::Filename => "filename",
            SemType::Lineno => "lineno",
            SemType::Index => "index",
            SemType::Scope => "scope",
            SemType::Opcode => "opcode",
        }
    }
}

/// Value attached to a merge point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MpValue {
    Int(i64),
    Str(String),
}

impl From<i64> for MpValue {
    fn from(value: i64) -> Self {
        MpValue::Int(value)
    }
}

impl From<&str> for MpValue {
    fn from(value: &str) -> Self {
        MpValue::Str(value.to_string())
    }
}

impl From<String> for MpValue {
    fn from(value: String) -> Self {
        MpValue::Str(value)
    }
}

/// Debug merge point: marks where a trace passes a source position
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MergePoint {
    pub index: u64,

    #[serde(default)]
    pub values: BTreeMap<SemType, MpValue>,
}

impl MergePoint {
    pub fn new(index: u64) -> Self {
        Self {
            index,
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, sem_type: SemType, value: impl Into<MpValue>) -> Self {
        self.values.insert(sem_type, value.into());
        self
    }

    pub fn filename(&self) -> Option<&str> {
        match self.values.get(&SemType::Filename)? {
            MpValue::Str(s) => Some(s),
            MpValue::Int(_) => None,
        }
    }

    pub fn lineno(&self) -> Option<i64> {
        match self.values.get(&SemType::Lineno)? {
            MpValue::Int(n) => Some(*n),
            MpValue::Str(s) => s.parse().ok(),
        }
    }

    pub fn scope(&self) -> Option<&str> {
        match self.values.get(&SemType::Scope)? {
            MpValue::Str(s) => Some(s),
            MpValue::Int(_) => None,
        }
    }
}
