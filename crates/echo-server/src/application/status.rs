//! Status page rendering.

use echo_core::{ConnectionStats, StatusReport};

/// Renders the current counters as the status page body,
/// e.g. `{"max":3,"active":2}`.
///
/// Both values come from a single snapshot, so the body never shows
/// `active > max`.
///
/// # Errors
///
/// Propagates the `serde_json` error from [`StatusReport::to_json`].
pub fn status_body(stats: &ConnectionStats) -> Result<String, serde_json::Error> {
    StatusReport::from(stats.snapshot()).to_json()
}
