//! Running totals over classified log records.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{LogRecord, StatusCode};

/// Point-in-time copy of the accumulated totals.
///
/// `status_counts` only holds codes seen at least once, ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub total_bytes: u64,
    pub status_counts: BTreeMap<StatusCode, u64>,
}

impl MetricsSnapshot {
    /// Count for one code, zero if never seen.
    pub fn count(&self, status: StatusCode) -> u64 {
        self.status_counts.get(&status).copied().unwrap_or(0)
    }
}

/// Total bytes and per-status counts for every record folded so far.
///
/// Counters are pre-seeded for each tracked code and never decremented.
#[derive(Debug, Clone, Default)]
pub struct MetricsAccumulator {
    total_bytes: u64,
    counts: [u64; StatusCode::ALL.len()],
    records: u64,
}

impl MetricsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one record to the totals.
    pub fn fold(&mut self, record: LogRecord) {
        self.total_bytes = self.total_bytes.saturating_add(record.bytes);
        self.counts[record.status.index()] += 1;
        self.records += 1;
    }

    /// Copies the current totals without touching them.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let status_counts = StatusCode::ALL
            .iter()
            .zip(self.counts.iter())
            .filter(|(_, count)| **count > 0)
            .map(|(code, count)| (*code, *count))
            .collect();

        MetricsSnapshot {
            total_bytes: self.total_bytes,
            status_counts,
        }
    }

    /// Number of records folded so far.
    pub fn records(&self) -> u64 {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: StatusCode, bytes: u64) -> LogRecord {
        LogRecord { status, bytes }
    }

    #[test]
    fn test_empty_snapshot() {
        let acc = MetricsAccumulator::new();
        let snap = acc.snapshot();
        assert_eq!(snap.total_bytes, 0);
        assert!(snap.status_counts.is_empty());
        assert_eq!(acc.records(), 0);
    }

    #[test]
    fn test_fold_sums_bytes_and_counts() {
        let mut acc = MetricsAccumulator::new();
        acc.fold(record(StatusCode::Ok, 100));
        acc.fold(record(StatusCode::NotFound, 50));
        acc.fold(record(StatusCode::Ok, 25));

        let snap = acc.snapshot();
        assert_eq!(snap.total_bytes, 175);
        assert_eq!(snap.count(StatusCode::Ok), 2);
        assert_eq!(snap.count(StatusCode::NotFound), 1);
        assert_eq!(snap.count(StatusCode::Forbidden), 0);
        assert_eq!(snap.status_counts.len(), 2);
        assert_eq!(acc.records(), 3);
    }

    #[test]
    fn test_fold_order_does_not_matter() {
        let records = [
            record(StatusCode::InternalServerError, 7),
            record(StatusCode::Ok, 3),
            record(StatusCode::Unauthorized, 11),
            record(StatusCode::Ok, 0),
            record(StatusCode::MethodNotAllowed, 19),
        ];

        let mut forward = MetricsAccumulator::new();
        records.iter().for_each(|r| forward.fold(*r));

        let mut reverse = MetricsAccumulator::new();
        records.iter().rev().for_each(|r| reverse.fold(*r));

        assert_eq!(forward.snapshot(), reverse.snapshot());
        assert_eq!(forward.snapshot().total_bytes, 40);
    }

    #[test]
    fn test_snapshot_does_not_reset() {
        let mut acc = MetricsAccumulator::new();
        acc.fold(record(StatusCode::BadRequest, 10));
        let first = acc.snapshot();
        let second = acc.snapshot();
        assert_eq!(first, second);

        acc.fold(record(StatusCode::BadRequest, 5));
        assert_eq!(acc.snapshot().total_bytes, 15);
        assert_eq!(first.total_bytes, 10);
    }

    #[test]
    fn test_snapshot_keys_ascending() {
        let mut acc = MetricsAccumulator::new();
        acc.fold(record(StatusCode::InternalServerError, 1));
        acc.fold(record(StatusCode::Ok, 1));
        acc.fold(record(StatusCode::MovedPermanently, 1));

        let codes: Vec<u16> = acc
            .snapshot()
            .status_counts
            .keys()
            .map(|c| c.as_u16())
            .collect();
        assert_eq!(codes, vec![200, 301, 500]);
    }

    #[test]
    fn test_snapshot_serializes_codes_as_keys() {
        let mut acc = MetricsAccumulator::new();
        acc.fold(record(StatusCode::NotFound, 50));
        let json = serde_json::to_string(&acc.snapshot()).unwrap();
        assert_eq!(json, r#"{"total_bytes":50,"status_counts":{"404":1}}"#);
    }
}
