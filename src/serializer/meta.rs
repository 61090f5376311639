//! Session metadata shown next to CPU profiles.

use crate::profile::ProfileSession;
use crate::utils::config::TIME_FORMAT;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuMeta {
    pub arch: String,

    /// Operating system followed by the word size, e.g. `linux 64`
    pub os: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

pub fn serialize_cpu_meta(session: &ProfileSession) -> CpuMeta {
    CpuMeta {
        arch: session.get_meta("arch", "unknown").to_string(),
        os: format!(
            "{} {}",
            session.get_meta("os", "unknown"),
            session.get_meta("bits", "")
        ),
        start_time: session
            .start_time
            .map(|t| t.format(TIME_FORMAT).to_string()),
        end_time: session.end_time.map(|t| t.format(TIME_FORMAT).to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_projection_with_times() {
        let mut session = ProfileSession::new("pypy");
        session.meta.insert("arch".to_string(), "x86_64".to_string());
        session.meta.insert("os".to_string(), "linux".to_string());
        session.meta.insert("bits".to_string(), "64".to_string());
        session.start_time = NaiveDate::from_ymd_opt(2024, 3, 5)
            .and_then(|d| d.and_hms_opt(14, 7, 9));

        let meta = serialize_cpu_meta(&session);
        assert_eq!(meta.arch, "x86_64");
        assert_eq!(meta.os, "linux 64");
        assert_eq!(meta.start_time.as_deref(), Some("03/05/2024 14:07:09"));
        assert_eq!(meta.end_time, None);
    }

    #[test]
    fn test_projection_defaults() {
        let meta = serialize_cpu_meta(&ProfileSession::new("cpython"));
        assert_eq!(meta.arch, "unknown");
        assert_eq!(meta.os, "unknown ");

        let value = serde_json::to_value(&meta).unwrap();
        assert!(value.get("start_time").is_none());
        assert!(value.get("end_time").is_none());
    }
}
