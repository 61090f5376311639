//! Serializers turning forests and profiles into JSON-ready structures.
//!
//! This module handles:
//! - Forest overview and nested trace detail
//! - The stitch graph between traces
//! - Flamegraph, memory and metadata views of a profile session
//!
//! Every serializer borrows its input and returns a plain `Serialize` value;
//! none of them fails.

pub mod flamegraph;
pub mod forest;
pub mod memory;
pub mod meta;
pub mod operation;
pub mod stitch;
pub mod trace;

// Re-export main entry points
pub use flamegraph::{serialize_flamegraph, FlamegraphDocument};
pub use forest::{serialize_forest, ForestMeta, TraceMeta};
pub use memory::{
    resample, serialize_memory, serialize_memory_with_window, summarize_stacks, MemoryGraph,
    MemoryWindows, StackSummary,
};
pub use meta::{serialize_cpu_meta, CpuMeta};
pub use operation::{serialize_op, OperationJson};
pub use stitch::{serialize_stitches, StitchGraph};
pub use trace::{serialize_trace, TraceDetail};
