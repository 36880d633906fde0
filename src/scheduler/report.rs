//! Per-run results.

use crate::auth::AttemptRecord;
use crate::scanner::ProbeResult;
use crate::types::RunId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counts for one credential batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub dispatched: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn merge(&mut self, other: BatchSummary) {
        self.dispatched += other.dispatched;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
    }
}

/// Counters for a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub targets: usize,
    pub ports_probed: usize,
    pub open_ports: usize,
    pub attempts: usize,
    pub valid_credentials: usize,
    pub duration_ms: u64,
}

/// Everything one run found.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub id: RunId,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Attack and timing mode, e.g. `exhaustive/steady`.
    pub technique: String,
    /// Open ports only.
    pub probes: Vec<ProbeResult>,
    pub credentials: Vec<AttemptRecord>,
    pub stats: RunStats,
}

impl ScanReport {
    /// Start a report; timestamps are fixed at finalization.
    pub fn new(technique: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: RunId::new(),
            started_at: now,
            completed_at: now,
            technique: technique.into(),
            probes: Vec::new(),
            credentials: Vec::new(),
            stats: RunStats::default(),
        }
    }

    /// Fill in results and counters.
    pub fn finalize(
        mut self,
        targets: usize,
        probes: Vec<ProbeResult>,
        attempts: BatchSummary,
        credentials: Vec<AttemptRecord>,
    ) -> Self {
        self.completed_at = Utc::now();
        let open: Vec<ProbeResult> = probes.iter().filter(|p| p.is_open()).cloned().collect();

        self.stats = RunStats {
            targets,
            ports_probed: probes.len(),
            open_ports: open.len(),
            attempts: attempts.dispatched,
            valid_credentials: credentials.len(),
            duration_ms: (self.completed_at - self.started_at)
                .num_milliseconds()
                .max(0) as u64,
        };
        self.probes = open;
        self.credentials = credentials;
        self
    }

    /// One-line summary.
    pub fn summary(&self) -> String {
        format!(
            "run {} ({}) - {} targets, {} open, {} attempts, {} valid [{:.2}s]",
            self.id.short(),
            self.technique,
            self.stats.targets,
            self.stats.open_ports,
            self.stats.attempts,
            self.stats.valid_credentials,
            self.stats.duration_ms as f64 / 1000.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Port, Target};
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_finalize_counts_and_keeps_open_only() {
        let target = Target::new("", IpAddr::V4(Ipv4Addr::LOCALHOST), true);
        let probes = vec![
            ProbeResult::open(target.clone(), Port::new(21).unwrap(), None),
            ProbeResult::closed(target.clone(), Port::new(22).unwrap()),
            ProbeResult::closed(target, Port::new(23).unwrap()),
        ];
        let attempts = BatchSummary {
            dispatched: 6,
            succeeded: 0,
            failed: 6,
        };

        let report = ScanReport::new("exhaustive/steady").finalize(1, probes, attempts, Vec::new());

        assert_eq!(report.stats.ports_probed, 3);
        assert_eq!(report.stats.open_ports, 1);
        assert_eq!(report.probes.len(), 1);
        assert_eq!(report.stats.attempts, 6);
        assert!(report.completed_at >= report.started_at);
        assert!(report.summary().contains("1 open, 6 attempts, 0 valid"));
    }

    #[test]
    fn test_batch_merge() {
        let mut total = BatchSummary::default();
        total.merge(BatchSummary {
            dispatched: 3,
            succeeded: 1,
            failed: 2,
        });
        total.merge(BatchSummary {
            dispatched: 2,
            succeeded: 0,
            failed: 2,
        });
        assert_eq!(total.dispatched, 5);
        assert_eq!(total.succeeded, 1);
        assert_eq!(total.failed, 4);
    }
}
