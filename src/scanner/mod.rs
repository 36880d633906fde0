//! Scanner module - TCP connect probing with bounded concurrency.
//!
//! The `Prober` trait abstracts a single connection attempt; `probe_all`
//! fans a batch of (target, port) jobs out under a concurrency ceiling.
//! Each probe also holds a permit from a caller-supplied semaphore while its
//! socket is open, so other batches drawing on the same semaphore count
//! against the same ceiling.

pub mod rate_limiter;
pub mod tcp;
pub mod traits;

use crate::types::{Port, Target};
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use std::sync::Arc;
use tokio::sync::Semaphore;

pub use rate_limiter::RateLimiter;
pub use tcp::{connect, TcpProber};
pub use traits::{ProbeResult, Prober};

/// Probe every (target, port) pair with at most `ceiling` probes in flight.
///
/// Every probe holds one permit from `permits` for its whole duration.
/// Results come back in completion order.
pub async fn probe_all(
    prober: Arc<dyn Prober>,
    jobs: Vec<(Target, Port)>,
    ceiling: usize,
    permits: Arc<Semaphore>,
    rate_limiter: Option<RateLimiter>,
    progress: Option<&ProgressBar>,
) -> Vec<ProbeResult> {
    stream::iter(jobs)
        .map(|(target, port)| {
            let prober = Arc::clone(&prober);
            let permits = Arc::clone(&permits);
            let limiter = rate_limiter.clone();
            let progress = progress.cloned();

            async move {
                if let Some(limiter) = limiter {
                    limiter.wait().await;
                }

                let result = match permits.acquire_owned().await {
                    Ok(_permit) => prober.probe(&target, port).await,
                    // Closed semaphore: the engine is shutting down.
                    Err(_) => ProbeResult::closed(target.clone(), port),
                };

                if let Some(ref pb) = progress {
                    pb.inc(1);
                    if result.is_open() {
                        pb.set_message(format!("open: {}:{}", target.ip, port));
                    }
                }

                result
            }
        })
        .buffer_unordered(ceiling.max(1))
        .collect()
        .await
}
