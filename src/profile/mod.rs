//! Read-only model of a sampling profile session.
//!
//! This module holds:
//! - The session (samples, symbol table, metadata)
//! - The call tree merged from its samples

pub mod call_tree;
pub mod session;

// Re-export main types
pub use call_tree::CallTree;
pub use session::{ProfileSession, Sample};
