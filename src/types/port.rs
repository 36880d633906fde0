//! Port types with validation and parsing.
//!
//! `Port` is always in 1-65535. `PortSpec` accepts single ports, comma lists
//! and inclusive ranges, plus named service groups used by the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated TCP port number (1-65535).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    pub const MIN: u16 = 1;
    pub const MAX: u16 = 65535;

    /// Create a new Port, returning None for 0.
    #[inline]
    pub const fn new(port: u16) -> Option<Self> {
        if port >= Self::MIN {
            Some(Self(port))
        } else {
            None
        }
    }

    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = PortError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(PortError::OutOfRange(value as u32))
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

/// Error type for port parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("port {0} is out of valid range (1-65535)")]
    OutOfRange(u32),
    #[error("invalid port number: {0}")]
    InvalidFormat(String),
    #[error("invalid port range: start ({0}) > end ({1})")]
    InvalidRange(u16, u16),
    #[error("empty port specification")]
    Empty,
}

/// An inclusive range of ports with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    start: Port,
    end: Port,
}

impl PortRange {
    pub fn new(start: Port, end: Port) -> Result<Self, PortError> {
        if start > end {
            Err(PortError::InvalidRange(start.0, end.0))
        } else {
            Ok(Self { start, end })
        }
    }

    pub const fn single(port: Port) -> Self {
        Self {
            start: port,
            end: port,
        }
    }

    pub const fn start(&self) -> Port {
        self.start
    }

    pub const fn end(&self) -> Port {
        self.end
    }

    pub const fn len(&self) -> usize {
        (self.end.0 - self.start.0) as usize + 1
    }

    /// Always false; a valid range holds at least one port.
    pub const fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = Port> {
        (self.start.0..=self.end.0).map(Port)
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Ports commonly exposed by internet-facing hosts.
const COMMON_PORTS: &[u16] = &[
    21, 22, 23, 25, 53, 80, 110, 135, 139, 143, 443, 445, 993, 995, 1723, 3306, 3389, 5900, 8080,
];
const WEB_PORTS: &[u16] = &[80, 443, 8080, 8443];
const FILE_PORTS: &[u16] = &[21, 22, 23, 69, 2121];
const MAIL_PORTS: &[u16] = &[25, 110, 143, 465, 587, 993, 995];
const DATABASE_PORTS: &[u16] = &[1433, 1521, 3306, 5432, 27017];
const REMOTE_PORTS: &[u16] = &[22, 23, 3389, 5900];

/// A port specification made of one or more ranges.
///
/// Supports formats like:
/// - Single port: "21"
/// - Comma-separated: "21,25,587"
/// - Range: "1-1024"
/// - Mixed: "21,25,8000-8100"
/// - Named groups: "common", "web", "file", "mail", "database", "remote"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    ranges: Vec<PortRange>,
}

impl PortSpec {
    pub const fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    pub fn add_range(&mut self, range: PortRange) {
        self.ranges.push(range);
    }

    pub fn add_port(&mut self, port: Port) {
        self.ranges.push(PortRange::single(port));
    }

    /// All ports, sorted and deduplicated.
    pub fn to_ports(&self) -> Vec<Port> {
        let mut ports: Vec<Port> = self.ranges.iter().flat_map(|r| r.iter()).collect();
        ports.sort_unstable();
        ports.dedup();
        ports
    }

    pub fn count(&self) -> usize {
        self.to_ports().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    fn from_list(list: &[u16]) -> Self {
        let mut spec = Self::new();
        for port in list.iter().copied().filter_map(Port::new) {
            spec.add_port(port);
        }
        spec
    }

    pub fn common() -> Self {
        Self::from_list(COMMON_PORTS)
    }

    pub fn web() -> Self {
        Self::from_list(WEB_PORTS)
    }

    pub fn file() -> Self {
        Self::from_list(FILE_PORTS)
    }

    pub fn mail() -> Self {
        Self::from_list(MAIL_PORTS)
    }

    pub fn database() -> Self {
        Self::from_list(DATABASE_PORTS)
    }

    pub fn remote() -> Self {
        Self::from_list(REMOTE_PORTS)
    }

    /// Look up a named group.
    pub fn named(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "common" => Some(Self::common()),
            "web" => Some(Self::web()),
            "file" => Some(Self::file()),
            "mail" | "email" => Some(Self::mail()),
            "database" | "db" => Some(Self::database()),
            "remote" => Some(Self::remote()),
            _ => None,
        }
    }
}

fn parse_port(text: &str) -> Result<Port, PortError> {
    let text = text.trim();
    let value: u32 = text
        .parse()
        .map_err(|_| PortError::InvalidFormat(text.to_string()))?;
    u16::try_from(value)
        .ok()
        .and_then(Port::new)
        .ok_or(PortError::OutOfRange(value))
}

impl FromStr for PortSpec {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PortError::Empty);
        }
        if let Some(spec) = Self::named(s) {
            return Ok(spec);
        }

        let mut spec = Self::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.split_once('-') {
                Some((low, high)) => {
                    let range = PortRange::new(parse_port(low)?, parse_port(high)?)?;
                    spec.add_range(range);
                }
                None => spec.add_port(parse_port(part)?),
            }
        }

        if spec.is_empty() {
            return Err(PortError::Empty);
        }
        Ok(spec)
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.ranges.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_validation() {
        assert!(Port::new(0).is_none());
        assert!(Port::new(1).is_some());
        assert!(Port::new(65535).is_some());
    }

    #[test]
    fn test_port_range_bounds() {
        let low = Port::new(10).unwrap();
        let high = Port::new(20).unwrap();
        assert_eq!(PortRange::new(low, high).unwrap().len(), 11);
        assert_eq!(
            PortRange::new(high, low),
            Err(PortError::InvalidRange(20, 10))
        );
    }

    #[test]
    fn test_port_spec_parsing() {
        assert_eq!("21".parse::<PortSpec>().unwrap().count(), 1);
        assert_eq!("21,25".parse::<PortSpec>().unwrap().count(), 2);
        assert_eq!("1-1024".parse::<PortSpec>().unwrap().count(), 1024);
        assert_eq!("21,25,8000-8010".parse::<PortSpec>().unwrap().count(), 13);
    }

    #[test]
    fn test_port_spec_rejects_bad_input() {
        assert_eq!("".parse::<PortSpec>(), Err(PortError::Empty));
        assert_eq!("0".parse::<PortSpec>(), Err(PortError::OutOfRange(0)));
        assert_eq!("70000".parse::<PortSpec>(), Err(PortError::OutOfRange(70000)));
        assert_eq!("100-50".parse::<PortSpec>(), Err(PortError::InvalidRange(100, 50)));
        assert!(matches!("ftp".parse::<PortSpec>(), Err(PortError::InvalidFormat(_))));
    }

    #[test]
    fn test_port_spec_dedup() {
        let spec: PortSpec = "25,25,21,25".parse().unwrap();
        let ports: Vec<u16> = spec.to_ports().into_iter().map(u16::from).collect();
        assert_eq!(ports, vec![21, 25]);
    }

    #[test]
    fn test_named_groups() {
        let mail: PortSpec = "mail".parse().unwrap();
        assert!(mail.to_ports().contains(&Port::new(25).unwrap()));
        assert_eq!(PortSpec::common().count(), COMMON_PORTS.len());
        assert!(PortSpec::named("nope").is_none());
    }
}
