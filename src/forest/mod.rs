//! Read-only model of a JIT trace forest.
//!
//! This module holds:
//! - The forest and its lookup tables (stitch targets, source lines)
//! - Traces, stages and links
//! - Operations and debug merge points

pub mod operation;
pub mod trace;
pub mod trace_forest;

// Re-export main types
pub use operation::{CoreDump, MergePoint, MpValue, Op, Operation, SemType};
pub use trace::{hex_id, Link, Stage, Trace};
pub use trace_forest::{SourceLine, TraceForest};
