//! Prober abstraction and probe results.

use crate::services::{classify, RiskTier, ServiceLabel};
use crate::types::{Port, Target};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Outcome of one connection attempt against a (target, port) pair.
///
/// A closed result never carries a service label, risk tier or banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    target: Target,
    port: Port,
    open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<ServiceLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    risk: Option<RiskTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    banner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_time_ms: Option<u64>,
}

impl ProbeResult {
    /// A port that accepted the connection, classified from its banner.
    pub fn open(target: Target, port: Port, banner: Option<String>) -> Self {
        let (service, risk) = classify(port.as_u16(), banner.as_deref());
        Self {
            target,
            port,
            open: true,
            service: Some(service),
            risk: Some(risk),
            banner,
            response_time_ms: None,
        }
    }

    /// A port that could not be connected to.
    pub fn closed(target: Target, port: Port) -> Self {
        Self {
            target,
            port,
            open: false,
            service: None,
            risk: None,
            banner: None,
            response_time_ms: None,
        }
    }

    /// Set the connect latency.
    pub fn with_response_time(mut self, time_ms: u64) -> Self {
        self.response_time_ms = Some(time_ms);
        self
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn port(&self) -> Port {
        self.port
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn service(&self) -> Option<ServiceLabel> {
        self.service
    }

    pub fn risk(&self) -> Option<RiskTier> {
        self.risk
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn response_time_ms(&self) -> Option<u64> {
        self.response_time_ms
    }

    /// Whether the classified service has a credential exchange.
    pub fn supports_credential_exchange(&self) -> bool {
        self.service
            .is_some_and(ServiceLabel::supports_credential_exchange)
    }
}

/// A way of probing one port.
///
/// Implementations never fail: an unreachable port is a closed result.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe a single port on a target.
    async fn probe(&self, target: &Target, port: Port) -> ProbeResult;

    /// The per-connection timeout in force.
    fn timeout(&self) -> Duration;
}
