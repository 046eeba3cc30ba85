//! Stats report flattening and per-stream delivery

use crate::host::RawStatsReport;
use peerlink_connector::{ReportEntry, StatsCollector, StatsReport};
use tracing::trace;

/// Flatten an engine report into entries ordered by report id
pub fn flatten_stats_report(raw: RawStatsReport) -> StatsReport {
    let mut entries: StatsReport = raw
        .into_iter()
        .map(|(id, stats)| ReportEntry { id, stats })
        .collect();
    entries.sort_by(|a, b| a.id.cmp(&b.id));
    entries
}

/// Flatten one stream's reports and hand the non-empty ones to `collector`
///
/// Returns false, without calling `collector`, when every report is empty.
pub(crate) fn deliver(
    collector: &mut StatsCollector<'_>,
    stream_id: &str,
    raw_reports: Vec<RawStatsReport>,
) -> bool {
    let batch: Vec<StatsReport> = raw_reports
        .into_iter()
        .map(flatten_stats_report)
        .filter(|report| !report.is_empty())
        .collect();

    if batch.is_empty() {
        trace!(stream_id, "no stats for stream, skipping");
        return false;
    }

    collector(batch, stream_id);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(ids: &[&str]) -> RawStatsReport {
        ids.iter()
            .map(|id| (id.to_string(), json!({ "id": id })))
            .collect()
    }

    #[test]
    fn test_flatten_orders_by_id() {
        let report = flatten_stats_report(raw(&["outbound-2", "codec-1", "inbound-9"]));
        let ids: Vec<&str> = report.iter().map(|entry| entry.id.as_str()).collect();
        assert_eq!(ids, vec!["codec-1", "inbound-9", "outbound-2"]);
        assert_eq!(report[0].stats["id"], "codec-1");
    }

    #[test]
    fn test_flatten_empty() {
        assert!(flatten_stats_report(RawStatsReport::new()).is_empty());
    }

    #[test]
    fn test_deliver_drops_empty_reports() {
        let mut calls = Vec::new();
        let mut collector = |batch: Vec<StatsReport>, stream_id: &str| {
            calls.push((stream_id.to_string(), batch.len()));
        };

        let delivered = deliver(
            &mut collector,
            "stream-a",
            vec![raw(&["inbound-1"]), RawStatsReport::new(), raw(&["inbound-2"])],
        );

        assert!(delivered);
        assert_eq!(calls, vec![("stream-a".to_string(), 2)]);
    }

    #[test]
    fn test_deliver_skips_stream_without_stats() {
        let mut calls = 0;
        let mut collector = |_: Vec<StatsReport>, _: &str| calls += 1;

        assert!(!deliver(&mut collector, "stream-b", vec![RawStatsReport::new()]));
        assert!(!deliver(&mut collector, "stream-c", Vec::new()));
        assert_eq!(calls, 0);
    }
}
