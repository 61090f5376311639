//! View command implementation.
//!
//! A view command:
//! 1. Loads a forest or profile document
//! 2. Runs the serializer for the requested view
//! 3. Writes the JSON result to a file or stdout

use crate::forest::{Trace, TraceForest};
use crate::output::{read_json, write_json, write_json_to};
use crate::profile::ProfileSession;
use crate::serializer::{
    serialize_cpu_meta, serialize_flamegraph, serialize_forest, serialize_memory_with_window,
    serialize_stitches, serialize_trace,
};
use crate::utils::config::DEFAULT_WINDOW_SIZE;
use crate::utils::error::InputError;
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Instant;

/// Which serialized view to produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Overview of every trace in a forest
    ForestMeta,

    /// Nested detail of one trace
    Trace { id: u64 },

    /// Stitch graph reachable from a root trace
    Stitches { root: u64 },

    /// Resampled memory profile
    Memory {
        start: i64,
        end: i64,
        window_size: usize,
    },

    /// Call tree with run metadata
    Flamegraph,

    /// Session metadata
    CpuMeta,
}

impl View {
    /// Whether this view reads a trace forest (otherwise a profile session)
    pub fn needs_forest(&self) -> bool {
        matches!(
            self,
            View::ForestMeta | View::Trace { .. } | View::Stitches { .. }
        )
    }
}

/// Arguments for a view command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct ViewArgs {
    /// Forest or profile document to read
    pub input: PathBuf,

    pub view: View,

    /// Output path, stdout when `None`
    pub output: Option<PathBuf>,

    /// Indent the JSON output
    pub pretty: bool,
}

impl Default for ViewArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::from("forest.json"),
            view: View::ForestMeta,
            output: None,
            pretty: true,
        }
    }
}

/// Execute a view command
///
/// **Public** - main entry point called from main.rs
pub fn execute_view(args: ViewArgs) -> Result<()> {
    let start_time = Instant::now();

    info!("Rendering {:?} from {}", args.view, args.input.display());

    let document = build_view(&args)?;

    match &args.output {
        Some(path) => {
            write_json(&document, path, args.pretty).context("Failed to write view JSON")?;
            info!("✓ View written to: {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            write_json_to(&document, stdout.lock(), args.pretty)
                .context("Failed to write view to stdout")?;
        }
    }

    info!("Done in {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(())
}

/// Load the input document and serialize the requested view
///
/// **Public** - returns the JSON value without writing it anywhere
pub fn build_view(args: &ViewArgs) -> Result<serde_json::Value> {
    let value = if args.view.needs_forest() {
        let forest: TraceForest = read_json(&args.input)
            .with_context(|| format!("Failed to load forest {}", args.input.display()))?;
        debug!("Loaded forest with {} traces", forest.trace_count());
        render_forest_view(&forest, &args.view)?
    } else {
        let session: ProfileSession = read_json(&args.input)
            .with_context(|| format!("Failed to load profile {}", args.input.display()))?;
        debug!("Loaded profile with {} samples", session.samples.len());
        render_profile_view(&session, &args.view)?
    };

    Ok(value)
}

/// Serialize a forest view
pub fn render_forest_view(forest: &TraceForest, view: &View) -> Result<serde_json::Value> {
    let value = match view {
        View::ForestMeta => serde_json::to_value(serialize_forest(forest))?,
        View::Trace { id } => serde_json::to_value(serialize_trace(forest, lookup(forest, *id)?))?,
        View::Stitches { root } => {
            serde_json::to_value(serialize_stitches(forest, lookup(forest, *root)?))?
        }
        other => anyhow::bail!("{:?} is not a forest view", other),
    };
    Ok(value)
}

/// Serialize a profile view
pub fn render_profile_view(session: &ProfileSession, view: &View) -> Result<serde_json::Value> {
    let value = match view {
        View::Memory {
            start,
            end,
            window_size,
        } => serde_json::to_value(serialize_memory_with_window(
            session,
            *start,
            *end,
            *window_size,
        ))?,
        View::Flamegraph => {
            let document = serialize_flamegraph(session);
            debug!(
                "Flamegraph covers {} samples in {} frames",
                document.data.profiles.total(),
                document.data.profiles.node_count()
            );
            serde_json::to_value(document)?
        }
        View::CpuMeta => serde_json::to_value(serialize_cpu_meta(session))?,
        other => anyhow::bail!("{:?} is not a profile view", other),
    };
    Ok(value)
}

fn lookup(forest: &TraceForest, id: u64) -> Result<&Trace, InputError> {
    forest
        .get_trace_by_id(id)
        .ok_or_else(|| InputError::Malformed(format!("unknown trace id {:#x}", id)))
}

/// Parse a trace id given as `0x`-prefixed hex or decimal
pub fn parse_trace_id(value: &str) -> Result<u64, InputError> {
    if let Some(hex_str) = value.strip_prefix("0x") {
        u64::from_str_radix(hex_str, 16)
            .map_err(|e| InputError::Malformed(format!("Invalid hex trace id: {}", e)))
    } else {
        value
            .parse::<u64>()
            .map_err(|e| InputError::Malformed(format!("Invalid decimal trace id: {}", e)))
    }
}

/// Validate view arguments
///
/// **Public** - can be called before execute_view for early validation
pub fn validate_args(args: &ViewArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Input path cannot be empty");
    }

    if let View::Memory {
        start,
        end,
        window_size,
    } = &args.view
    {
        if end < start {
            anyhow::bail!("Memory range end ({}) is before start ({})", end, start);
        }
        if *window_size == 0 {
            anyhow::bail!("window size must be greater than 0");
        }
    }

    Ok(())
}

/// Memory view over the whole profile with the default window
pub fn default_memory_view() -> View {
    View::Memory {
        start: 0,
        end: i64::MAX,
        window_size: DEFAULT_WINDOW_SIZE,
    }
}
