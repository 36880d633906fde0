//! Target specification types with CIDR and hostname support.
//!
//! Provides target parsing supporting:
//! - Single IP addresses (IPv4 and IPv6)
//! - CIDR notation (192.168.1.0/24), capped at a configurable host count
//! - Hostnames (mail.example.com)

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use trust_dns_resolver::TokioAsyncResolver;

/// A resolved network endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// The address as written by the operator, or the expanded host address.
    pub address: String,
    /// The IP address connections are made to.
    pub ip: IpAddr,
    /// Whether the host is known to be reachable.
    pub reachable: bool,
}

impl Target {
    /// Create a target from a literal token and its address.
    ///
    /// An empty token falls back to the textual IP so `address` is never empty.
    pub fn new(address: impl Into<String>, ip: IpAddr, reachable: bool) -> Self {
        let address = address.into();
        let address = if address.trim().is_empty() {
            ip.to_string()
        } else {
            address
        };
        Self {
            address,
            ip,
            reachable,
        }
    }

    /// Mark the target as reachable or not.
    pub fn with_reachable(mut self, reachable: bool) -> Self {
        self.reachable = reachable;
        self
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.address == self.ip.to_string() {
            write!(f, "{}", self.ip)
        } else {
            write!(f, "{} ({})", self.address, self.ip)
        }
    }
}

/// Error type for target parsing and resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("invalid target format: {0:?}")]
    InvalidFormat(String),
    #[error("invalid CIDR notation: {0}")]
    InvalidCidr(String),
    #[error("failed to resolve hostname '{0}': {1}")]
    DnsResolutionFailed(String, String),
    #[error("no IP addresses found for hostname '{0}'")]
    NoAddressesFound(String),
}

/// A parsed host token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// A single IP address.
    Single(IpAddr),
    /// A CIDR network range.
    Cidr(IpNetwork),
    /// A hostname to be resolved.
    Hostname(String),
}

impl TargetSpec {
    /// Default upper bound on hosts enumerated from one range.
    pub const DEFAULT_HOST_CAP: usize = 254;

    /// Parse a target token.
    pub fn parse(s: &str) -> Result<Self, TargetError> {
        let s = s.trim();

        if let Ok(ip) = s.parse::<IpAddr>() {
            return Ok(Self::Single(ip));
        }

        if s.contains('/') {
            let network: IpNetwork = s
                .parse()
                .map_err(|_| TargetError::InvalidCidr(s.to_string()))?;
            return Ok(Self::Cidr(network));
        }

        if is_valid_hostname(s) {
            return Ok(Self::Hostname(s.to_string()));
        }

        Err(TargetError::InvalidFormat(s.to_string()))
    }

    /// Resolve into concrete targets.
    ///
    /// Ranges expand to their usable host addresses, stopping silently after
    /// `host_cap` hosts. Range members start out unreachable until swept;
    /// single addresses and hostnames are assumed reachable.
    pub async fn resolve(&self, host_cap: usize) -> Result<Vec<Target>, TargetError> {
        match self {
            Self::Single(ip) => Ok(vec![Target::new(ip.to_string(), *ip, true)]),
            Self::Cidr(network) => Ok(expand_network(network, host_cap)),
            Self::Hostname(hostname) => {
                let ip = lookup_host(hostname).await?;
                Ok(vec![Target::new(hostname.clone(), ip, true)])
            }
        }
    }

    /// Whether this token denotes more than one host.
    pub fn is_range(&self) -> bool {
        matches!(self, Self::Cidr(net) if net.prefix() < max_prefix(net))
    }
}

fn max_prefix(network: &IpNetwork) -> u8 {
    match network {
        IpNetwork::V4(_) => 32,
        IpNetwork::V6(_) => 128,
    }
}

/// Enumerate the usable host addresses of a network, lazily, up to `cap`.
fn expand_network(network: &IpNetwork, cap: usize) -> Vec<Target> {
    let network = *network;
    network
        .iter()
        .filter(move |ip| is_usable_host(&network, ip))
        .take(cap)
        .map(|ip| Target::new(ip.to_string(), ip, false))
        .collect()
}

fn is_usable_host(network: &IpNetwork, ip: &IpAddr) -> bool {
    match (network, ip) {
        (IpNetwork::V4(net), IpAddr::V4(addr)) if net.prefix() < 31 => {
            *addr != net.network() && *addr != net.broadcast()
        }
        (IpNetwork::V6(net), IpAddr::V6(addr)) if net.prefix() < 127 => *addr != net.network(),
        _ => true,
    }
}

async fn lookup_host(hostname: &str) -> Result<IpAddr, TargetError> {
    let resolver = TokioAsyncResolver::tokio_from_system_conf()
        .map_err(|e| TargetError::DnsResolutionFailed(hostname.to_string(), e.to_string()))?;

    let response = resolver
        .lookup_ip(hostname)
        .await
        .map_err(|e| TargetError::DnsResolutionFailed(hostname.to_string(), e.to_string()))?;

    response
        .iter()
        .next()
        .ok_or_else(|| TargetError::NoAddressesFound(hostname.to_string()))
}

impl FromStr for TargetSpec {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(ip) => write!(f, "{}", ip),
            Self::Cidr(network) => write!(f, "{}", network),
            Self::Hostname(hostname) => write!(f, "{}", hostname),
        }
    }
}

/// Check if a string is a valid hostname.
fn is_valid_hostname(s: &str) -> bool {
    if s.is_empty() || s.len() > 253 {
        return false;
    }

    s.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && label.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
            && label.chars().last().is_some_and(|c| c.is_ascii_alphanumeric())
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn v4(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(a, b, c, d))
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(
            TargetSpec::parse("192.168.1.1").unwrap(),
            TargetSpec::Single(v4(192, 168, 1, 1))
        );
        assert!(matches!(TargetSpec::parse("::1").unwrap(), TargetSpec::Single(IpAddr::V6(_))));
        assert!(matches!(TargetSpec::parse("10.0.0.0/24").unwrap(), TargetSpec::Cidr(_)));
        assert!(matches!(
            TargetSpec::parse("mail.example.com").unwrap(),
            TargetSpec::Hostname(_)
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(TargetSpec::parse(""), Err(TargetError::InvalidFormat(_))));
        assert!(matches!(TargetSpec::parse("bad host!"), Err(TargetError::InvalidFormat(_))));
        assert!(matches!(TargetSpec::parse("10.0.0.0/40"), Err(TargetError::InvalidCidr(_))));
    }

    #[tokio::test]
    async fn test_single_address_is_reachable_without_probe() {
        let targets = TargetSpec::parse("127.0.0.1").unwrap().resolve(254).await.unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].address, "127.0.0.1");
        assert!(targets[0].reachable);
    }

    #[tokio::test]
    async fn test_slash_30_yields_usable_hosts() {
        let spec = TargetSpec::parse("192.168.10.0/30").unwrap();
        let ips: Vec<IpAddr> = spec.resolve(254).await.unwrap().into_iter().map(|t| t.ip).collect();
        assert_eq!(ips, vec![v4(192, 168, 10, 1), v4(192, 168, 10, 2)]);
    }

    #[tokio::test]
    async fn test_large_range_is_capped() {
        let spec = TargetSpec::parse("10.0.0.0/16").unwrap();
        let targets = spec.resolve(TargetSpec::DEFAULT_HOST_CAP).await.unwrap();
        assert_eq!(targets.len(), 254);
        assert_eq!(targets[0].ip, v4(10, 0, 0, 1));
        assert!(targets.iter().all(|t| !t.reachable));

        let small = spec.resolve(10).await.unwrap();
        assert_eq!(small.len(), 10);
    }

    #[tokio::test]
    async fn test_point_to_point_networks_keep_both_hosts() {
        let spec = TargetSpec::parse("10.1.1.0/31").unwrap();
        assert_eq!(spec.resolve(254).await.unwrap().len(), 2);
        let spec = TargetSpec::parse("10.1.1.7/32").unwrap();
        assert!(!spec.is_range());
        assert_eq!(spec.resolve(254).await.unwrap().len(), 1);
    }

    #[test]
    fn test_empty_address_falls_back_to_ip() {
        let target = Target::new("", v4(10, 0, 0, 5), true);
        assert_eq!(target.address, "10.0.0.5");
    }

    #[test]
    fn test_valid_hostname() {
        assert!(is_valid_hostname("example.com"));
        assert!(is_valid_hostname("my-server"));
        assert!(!is_valid_hostname("-invalid.com"));
        assert!(!is_valid_hostname("a..b"));
    }
}
