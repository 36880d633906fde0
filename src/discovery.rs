//! Host discovery: target resolution and liveness sweeps.
//!
//! Liveness is checked with the system `ping` utility first, then with TCP
//! connects against a few common ports. A refused connection counts as a
//! live host.

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::scanner::connect;
use crate::types::{Target, TargetSpec};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, trace};

/// Ports tried when ICMP gets no answer.
pub const FALLBACK_PORTS: &[u16] = &[22, 80, 443, 445, 3389];

/// Concurrent liveness checker.
#[derive(Debug, Clone)]
pub struct LivenessProber {
    timeout: Duration,
    concurrency: usize,
    use_icmp: bool,
    fallback_ports: Vec<u16>,
}

impl LivenessProber {
    pub fn new(timeout: Duration, concurrency: usize) -> Self {
        Self {
            timeout,
            concurrency: concurrency.max(1),
            use_icmp: true,
            fallback_ports: FALLBACK_PORTS.to_vec(),
        }
    }

    /// Skip the `ping` step and rely on TCP only.
    pub fn without_icmp(mut self) -> Self {
        self.use_icmp = false;
        self
    }

    pub fn with_fallback_ports(mut self, ports: Vec<u16>) -> Self {
        self.fallback_ports = ports;
        self
    }

    /// Return the responding hosts, in input order, marked reachable.
    pub async fn sweep(&self, targets: Vec<Target>) -> Vec<Target> {
        let candidates = targets.len();
        let alive: Vec<Target> = stream::iter(targets)
            .map(|target| async move {
                let alive = self.is_alive(target.ip).await;
                (target, alive)
            })
            .buffered(self.concurrency)
            .filter_map(|(target, alive)| async move { alive.then(|| target.with_reachable(true)) })
            .collect()
            .await;

        info!(candidates, alive = alive.len(), "liveness sweep finished");
        alive
    }

    /// Check one address.
    pub async fn is_alive(&self, ip: IpAddr) -> bool {
        if self.use_icmp && self.ping(ip).await {
            trace!(%ip, "echo reply");
            return true;
        }

        for &port in &self.fallback_ports {
            match connect(SocketAddr::new(ip, port), self.timeout).await {
                Ok(_) => {
                    trace!(%ip, port, "tcp connect");
                    return true;
                }
                Err(failure) if failure.proves_host_alive() => {
                    trace!(%ip, port, "tcp refused");
                    return true;
                }
                Err(failure) => trace!(%ip, port, %failure, "no answer"),
            }
        }
        false
    }

    async fn ping(&self, ip: IpAddr) -> bool {
        let mut command = Command::new("ping");
        #[cfg(windows)]
        command
            .arg("-n")
            .arg("1")
            .arg("-w")
            .arg(self.timeout.as_millis().to_string());
        #[cfg(not(windows))]
        command
            .arg("-c")
            .arg("1")
            .arg("-W")
            .arg(self.timeout.as_secs().max(1).to_string());

        command
            .arg(ip.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        // Allow the utility its own startup time on top of the reply wait.
        let limit = self.timeout + Duration::from_secs(1);
        match timeout(limit, command.status()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                debug!(error = %e, "ping unavailable");
                false
            }
            Err(_) => false,
        }
    }
}

/// Parse and resolve host tokens into a de-duplicated target list.
///
/// Range members are swept when `sweep` is set; otherwise they are returned
/// unconfirmed. Single addresses and hostnames are never swept.
pub async fn resolve_targets<S: AsRef<str>>(
    tokens: &[S],
    config: &EngineConfig,
    sweep: bool,
) -> EngineResult<Vec<Target>> {
    config.validate()?;

    let prober = LivenessProber::new(config.liveness_timeout(), config.concurrency);
    let mut seen = HashSet::new();
    let mut targets = Vec::new();

    for token in tokens {
        let spec = TargetSpec::parse(token.as_ref())?;
        let mut resolved = spec.resolve(config.max_hosts).await?;
        debug!(token = token.as_ref(), hosts = resolved.len(), "resolved");

        if sweep && spec.is_range() {
            resolved = prober.sweep(resolved).await;
        }

        targets.extend(resolved.into_iter().filter(|t| seen.insert(t.ip)));
    }

    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use std::net::Ipv4Addr;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_refused_connection_proves_liveness() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let closed = listener.local_addr().unwrap().port();
        drop(listener);

        let prober = LivenessProber::new(Duration::from_millis(300), 4)
            .without_icmp()
            .with_fallback_ports(vec![closed]);

        assert!(prober.is_alive(IpAddr::V4(Ipv4Addr::LOCALHOST)).await);
    }

    #[tokio::test]
    async fn test_sweep_marks_reachable_in_order() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let prober = LivenessProber::new(Duration::from_millis(300), 2)
            .without_icmp()
            .with_fallback_ports(vec![port]);
        let targets = vec![
            Target::new("", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), false),
            Target::new("", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 2)), false),
        ];

        let alive = prober.sweep(targets).await;

        assert!(!alive.is_empty());
        assert_eq!(alive[0].ip, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(alive.iter().all(|t| t.reachable));
    }

    #[tokio::test]
    async fn test_no_methods_means_nothing_alive() {
        let prober = LivenessProber::new(Duration::from_millis(100), 2)
            .without_icmp()
            .with_fallback_ports(Vec::new());
        let targets = vec![Target::new("", IpAddr::V4(Ipv4Addr::LOCALHOST), false)];
        assert!(prober.sweep(targets).await.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_targets_dedups_by_ip() {
        let config = EngineConfig::default();
        let tokens = ["10.0.0.1", "10.0.0.0/30", "10.0.0.2"];

        let targets = resolve_targets(&tokens, &config, false).await.unwrap();
        let ips: Vec<String> = targets.iter().map(|t| t.ip.to_string()).collect();

        assert_eq!(ips, ["10.0.0.1", "10.0.0.2"]);
        assert!(targets[0].reachable);
        assert!(!targets[1].reachable);
    }

    #[tokio::test]
    async fn test_resolve_targets_rejects_bad_input() {
        let config = EngineConfig::default();
        let result = resolve_targets(&["10.0.0.0/99"], &config, false).await;
        assert!(matches!(result, Err(EngineError::Target(_))));

        let config = EngineConfig {
            max_hosts: 0,
            ..EngineConfig::default()
        };
        let result = resolve_targets(&["10.0.0.1"], &config, false).await;
        assert!(matches!(result, Err(EngineError::Config(_))));
    }
}
