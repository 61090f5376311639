//! A sampling profile session as handed over by the collector.

use super::call_tree::CallTree;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One stack sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Frame addresses, outermost frame first
    pub stack: Vec<u64>,

    /// Number of times this stack was observed
    #[serde(default = "default_count")]
    pub count: u64,

    #[serde(default)]
    pub thread_id: u64,

    /// Memory in use when the sample was taken
    #[serde(default)]
    pub mem: u64,
}

fn default_count() -> u64 {
    1
}

impl Sample {
    pub fn new(stack: Vec<u64>, mem: u64) -> Self {
        Self {
            stack,
            count: 1,
            thread_id: 0,
            mem,
        }
    }
}

/// Everything recorded while profiling one program run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileSession {
    /// Name of the profiled interpreter/VM
    pub interp: String,

    #[serde(default)]
    pub argv: Vec<String>,

    /// Free-form key/value metadata (`arch`, `os`, `bits`, ...)
    #[serde(default)]
    pub meta: BTreeMap<String, String>,

    #[serde(default)]
    pub start_time: Option<NaiveDateTime>,

    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,

    #[serde(default)]
    pub samples: Vec<Sample>,

    /// Frame address to symbol name
    #[serde(default)]
    pub addr_names: BTreeMap<u64, String>,
}

impl ProfileSession {
    pub fn new(interp: impl Into<String>) -> Self {
        Self {
            interp: interp.into(),
            ..Default::default()
        }
    }

    /// Metadata lookup with a fallback value
    pub fn get_meta<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.meta.get(key).map(String::as_str).unwrap_or(default)
    }

    /// Command line of the profiled program, without the interpreter
    pub fn argv_line(&self) -> String {
        self.argv.join(" ")
    }

    /// Symbol for a frame address, hex address when unknown
    pub fn frame_name(&self, addr: u64) -> String {
        self.addr_names
            .get(&addr)
            .cloned()
            .unwrap_or_else(|| format!("{:#x}", addr))
    }

    pub fn call_tree(&self) -> CallTree {
        CallTree::from_session(self)
    }
}
