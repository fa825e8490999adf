//! Small helpers shared by the store, the controller types and the CLI.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Generate a fresh opaque profile identifier.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Current Unix timestamp in milliseconds
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Render a delay for display: `-` when missing or non-positive.
pub fn format_delay(delay: Option<i64>) -> String {
    match delay {
        Some(ms) if ms > 0 => format!("{ms}ms"),
        _ => "-".to_string(),
    }
}

/// Coarse latency grade used by front-ends to pick a colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelayGrade {
    Unknown,
    Good,
    Fair,
    Poor,
}

impl DelayGrade {
    pub fn from_delay(delay: Option<i64>) -> Self {
        match delay {
            Some(ms) if ms <= 0 => Self::Unknown,
            None => Self::Unknown,
            Some(ms) if ms < 200 => Self::Good,
            Some(ms) if ms < 500 => Self::Fair,
            Some(_) => Self::Poor,
        }
    }
}
