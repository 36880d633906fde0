//! Shared, append-only store of findings.
//!
//! Cloning a `ResultStore` yields another handle to the same list. Every
//! appended finding is also broadcast to subscribers, which is how the live
//! log is fed.

use crate::auth::AttemptRecord;
use crate::scanner::ProbeResult;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::info;

const FEED_CAPACITY: usize = 256;

/// Something worth reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    OpenPort(ProbeResult),
    ValidCredential(AttemptRecord),
}

#[derive(Debug, Clone)]
pub struct ResultStore {
    findings: Arc<Mutex<Vec<Finding>>>,
    feed: broadcast::Sender<Finding>,
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultStore {
    pub fn new() -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            findings: Arc::new(Mutex::new(Vec::new())),
            feed,
        }
    }

    // Poisoning is ignored: a push never leaves the Vec half-written.
    fn lock(&self) -> MutexGuard<'_, Vec<Finding>> {
        self.findings.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a finding.
    ///
    /// The broadcast happens under the lock, so the feed sees findings in
    /// snapshot order.
    pub fn record(&self, finding: Finding) {
        let mut findings = self.lock();
        findings.push(finding.clone());
        // No subscribers is fine.
        let _ = self.feed.send(finding);
    }

    /// Append an open port. Closed results are ignored.
    pub fn record_probe(&self, result: ProbeResult) -> bool {
        if !result.is_open() {
            return false;
        }
        info!(
            host = %result.target(),
            port = %result.port(),
            service = ?result.service(),
            "open port"
        );
        self.record(Finding::OpenPort(result));
        true
    }

    /// Append a successful attempt. Unsuccessful records are ignored.
    pub fn record_attempt(&self, record: AttemptRecord) -> bool {
        if !record.succeeded {
            return false;
        }
        info!(
            protocol = %record.protocol,
            host = %record.target,
            port = %record.port,
            credential = %record.credential,
            "valid credential"
        );
        self.record(Finding::ValidCredential(record));
        true
    }

    /// Copy of every finding in insertion order.
    pub fn snapshot(&self) -> Vec<Finding> {
        self.lock().clone()
    }

    pub fn probes(&self) -> Vec<ProbeResult> {
        self.lock()
            .iter()
            .filter_map(|f| match f {
                Finding::OpenPort(p) => Some(p.clone()),
                Finding::ValidCredential(_) => None,
            })
            .collect()
    }

    pub fn credentials(&self) -> Vec<AttemptRecord> {
        self.lock()
            .iter()
            .filter_map(|f| match f {
                Finding::ValidCredential(r) => Some(r.clone()),
                Finding::OpenPort(_) => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Receive every finding appended from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Finding> {
        self.feed.subscribe()
    }
}
