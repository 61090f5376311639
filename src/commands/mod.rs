//! CLI command implementations.
//!
//! Commands orchestrate the library components: load a document, run a
//! serializer, write the result.

pub mod view;

// Re-export main command functions
pub use view::{
    build_view, default_memory_view, execute_view, parse_trace_id, validate_args, View, ViewArgs,
};
