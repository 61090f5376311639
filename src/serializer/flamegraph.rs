//! Flamegraph document: the session's call tree plus run metadata.

use crate::profile::{CallTree, ProfileSession};
use crate::utils::config::FLAMEGRAPH_VERSION;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct FlamegraphDocument {
    pub data: FlamegraphData,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlamegraphData {
    #[serde(rename = "VM")]
    pub vm: String,

    /// Call tree, serialized by the tree itself
    pub profiles: CallTree,

    /// Interpreter followed by the program's arguments
    pub argv: String,

    pub version: u32,
}

pub fn serialize_flamegraph(session: &ProfileSession) -> FlamegraphDocument {
    FlamegraphDocument {
        data: FlamegraphData {
            vm: session.interp.clone(),
            profiles: session.call_tree(),
            argv: format!("{} {}", session.interp, session.argv_line()),
            version: FLAMEGRAPH_VERSION,
        },
    }
}
