//! vmlog Studio
//!
//! Serializers that turn JIT trace forests and sampling profiles into
//! compact JSON documents for a visualization front end.
//!
//! This crate provides the core implementation for the `vmlog` CLI tool.
//!
//! ## Views
//!
//! - Forest overview and nested trace detail (`serializer::forest`,
//!   `serializer::trace`)
//! - Stitch graph between traces (`serializer::stitch`)
//! - Flamegraph, resampled memory profile and session metadata
//!   (`serializer::flamegraph`, `serializer::memory`, `serializer::meta`)
//!
//! ```bash
//! vmlog meta --forest forest.json
//! vmlog memory --profile profile.json --start 0 --end 5000
//! ```

pub mod commands;
pub mod forest;
pub mod output;
pub mod profile;
pub mod serializer;
pub mod utils;
