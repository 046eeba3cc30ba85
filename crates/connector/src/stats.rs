//! Flattened statistics reports

use serde::{Deserialize, Serialize};

/// One statistics object keyed by its report id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub id: String,
    pub stats: serde_json::Value,
}

/// Ordered report entries for one track
pub type StatsReport = Vec<ReportEntry>;

/// Receives one batch of per-track reports per stream, with the stream id
///
/// The collector is only used for the duration of one collection call, so
/// it may borrow from the caller.
pub type StatsCollector<'a> = dyn FnMut(Vec<StatsReport>, &str) + Send + 'a;
