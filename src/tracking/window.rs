//! Trailing 24h series of mined-total samples.

use serde::{Deserialize, Serialize};

/// Horizon of the series, in milliseconds.
pub const WINDOW_MS: u64 = 24 * 60 * 60 * 1000;

/// One point of the mined-total series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Epoch milliseconds
    #[serde(rename = "t")]
    pub timestamp: u64,
    #[serde(rename = "minedTotal", default)]
    pub cumulative_mined: f64,
}

impl Sample {
    pub fn new(timestamp: u64, cumulative_mined: f64) -> Self {
        Self { timestamp, cumulative_mined }
    }
}

/// Oldest timestamp still inside the window ending at `now`.
pub fn cutoff(now: u64) -> u64 {
    now.saturating_sub(WINDOW_MS)
}

/// Keep samples with `timestamp >= now - 24h`.
pub fn prune(mut samples: Vec<Sample>, now: u64) -> Vec<Sample> {
    let cutoff = cutoff(now);
    samples.retain(|s| s.timestamp >= cutoff);
    samples
}

/// Append a sample. A timestamp older than the current tail (wall clock
/// stepped back) is pinned to the tail so the series stays ordered.
pub fn append(mut samples: Vec<Sample>, mut sample: Sample) -> Vec<Sample> {
    if let Some(last) = samples.last() {
        sample.timestamp = sample.timestamp.max(last.timestamp);
    }
    samples.push(sample);
    samples
}
