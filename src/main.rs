//! vmlog CLI
//!
//! Renders JIT trace forests and sampling profiles as JSON views.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use vmlog_studio::commands::{execute_view, parse_trace_id, validate_args, View, ViewArgs};
use vmlog_studio::utils::config::{DEFAULT_WINDOW_SIZE, FLAMEGRAPH_VERSION};

/// vmlog - JSON views of JIT traces and profiles
#[derive(Parser, Debug)]
#[command(name = "vmlog")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write the view to this file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Emit compact JSON
    #[arg(long, global = true)]
    compact: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Overview of all traces in a forest
    Meta {
        /// Path to forest JSON
        #[arg(short, long)]
        forest: PathBuf,
    },

    /// Nested detail of one trace
    Trace {
        /// Path to forest JSON
        #[arg(short, long)]
        forest: PathBuf,

        /// Trace id (hex with 0x prefix, or decimal)
        #[arg(long)]
        id: String,
    },

    /// Stitch graph reachable from a root trace
    Stitches {
        /// Path to forest JSON
        #[arg(short, long)]
        forest: PathBuf,

        /// Root trace id (hex with 0x prefix, or decimal)
        #[arg(long)]
        root: String,
    },

    /// Memory profile resampled into windows
    Memory {
        /// Path to profile JSON
        #[arg(short, long)]
        profile: PathBuf,

        /// First sample index
        #[arg(long, default_value = "0")]
        start: i64,

        /// Sample index to stop before (clamped to the profile length)
        #[arg(long, default_value_t = i64::MAX)]
        end: i64,

        /// Number of window edges
        #[arg(long, env = "VMLOG_WINDOW_SIZE", default_value_t = DEFAULT_WINDOW_SIZE)]
        window: usize,
    },

    /// Call tree of a profile
    Flamegraph {
        /// Path to profile JSON
        #[arg(short, long)]
        profile: PathBuf,
    },

    /// Session metadata of a profile
    CpuMeta {
        /// Path to profile JSON
        #[arg(short, long)]
        profile: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let (input, view) = match cli.command {
        Commands::Meta { forest } => (forest, View::ForestMeta),
        Commands::Trace { forest, id } => (forest, View::Trace { id: parse_trace_id(&id)? }),
        Commands::Stitches { forest, root } => (
            forest,
            View::Stitches {
                root: parse_trace_id(&root)?,
            },
        ),
        Commands::Memory {
            profile,
            start,
            end,
            window,
        } => (
            profile,
            View::Memory {
                start,
                end,
                window_size: window,
            },
        ),
        Commands::Flamegraph { profile } => (profile, View::Flamegraph),
        Commands::CpuMeta { profile } => (profile, View::CpuMeta),
        Commands::Version => {
            display_version();
            return Ok(());
        }
    };

    let args = ViewArgs {
        input,
        view,
        output: cli.output,
        pretty: !cli.compact,
    };

    // Validate args first
    validate_args(&args)?;

    execute_view(args)?;

    Ok(())
}

/// Display version information
///
/// **Private** - internal command implementation
fn display_version() {
    println!("vmlog Studio v{}", env!("CARGO_PKG_VERSION"));
    println!("Flamegraph schema: v{}", FLAMEGRAPH_VERSION);
    println!();
    println!("JSON views of JIT trace forests and sampling profiles.");
}
