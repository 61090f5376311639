//! Configuration and constants for the serializers and the CLI.

/// Schema version reported in flamegraph documents
pub const FLAMEGRAPH_VERSION: u32 = 2;

/// Number of bin edges requested when resampling a memory profile
pub const DEFAULT_WINDOW_SIZE: usize = 100;

/// Format used for session start/end timestamps
pub const TIME_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Stage holding the machine-level operations of a compiled trace
pub const ASM_STAGE: &str = "asm";

/// Trace type marking a bridge (a trace attached to a failing guard)
pub const BRIDGE_TYPE: &str = "bridge";

/// Operation name prefix identifying guards
pub const GUARD_PREFIX: &str = "guard_";

/// Stitch target rendered when a guard has no resolvable continuation
pub const NULL_TARGET: &str = "0x0";

// Defaults for trace metadata when no merge point is recorded
pub const UNKNOWN_SCOPE: &str = "unknown";
pub const UNKNOWN_LINENO: i64 = -1;
