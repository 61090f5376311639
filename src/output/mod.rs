//! Reading input documents and writing serialized views.

pub mod json;

// Re-export main functions
pub use json::{read_json, write_json, write_json_to};
