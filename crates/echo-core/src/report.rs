//! Wire form of the status endpoint response.
//!
//! The body is a compact JSON object with `max` first and `active` second:
//!
//! ```text
//! {"max":3,"active":2}
//! ```
//!
//! No whitespace and no trailing newline.  Field order follows the struct
//! declaration order, which `serde_json` preserves.

use serde::{Deserialize, Serialize};

use crate::stats::StatsSnapshot;

/// The JSON object returned by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Peak number of simultaneously open echo sessions.
    pub max: u64,
    /// Number of echo sessions open right now.
    pub active: u64,
}

impl StatusReport {
    /// Serializes the report to its compact JSON form.
    ///
    /// # Errors
    ///
    /// Propagates any `serde_json` serialization error.  For this plain
    /// struct of two integers that does not happen in practice.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<StatsSnapshot> for StatusReport {
    fn from(snapshot: StatsSnapshot) -> Self {
        Self {
            max: snapshot.max,
            active: snapshot.active,
        }
    }
}
