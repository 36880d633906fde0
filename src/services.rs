//! Service classification from port numbers and banners.
//!
//! `classify` is a pure lookup: a fixed port table, overridden by a short
//! allow-list of protocol tokens found in the banner.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol label assigned to an open port.
///
/// Serialized the same way it is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceLabel {
    Ftp,
    Ssh,
    #[serde(rename = "Telnet")]
    Telnet,
    Smtp,
    Dns,
    Http,
    Https,
    Pop3,
    Imap,
    Imaps,
    Pop3s,
    Mssql,
    #[serde(rename = "Oracle")]
    Oracle,
    #[serde(rename = "MySQL")]
    Mysql,
    Rdp,
    #[serde(rename = "PostgreSQL")]
    Postgresql,
    Vnc,
    #[serde(rename = "MongoDB")]
    Mongodb,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl ServiceLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ftp => "FTP",
            Self::Ssh => "SSH",
            Self::Telnet => "Telnet",
            Self::Smtp => "SMTP",
            Self::Dns => "DNS",
            Self::Http => "HTTP",
            Self::Https => "HTTPS",
            Self::Pop3 => "POP3",
            Self::Imap => "IMAP",
            Self::Imaps => "IMAPS",
            Self::Pop3s => "POP3S",
            Self::Mssql => "MSSQL",
            Self::Oracle => "Oracle",
            Self::Mysql => "MySQL",
            Self::Rdp => "RDP",
            Self::Postgresql => "PostgreSQL",
            Self::Vnc => "VNC",
            Self::Mongodb => "MongoDB",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether a credential exchange exists for this protocol.
    pub fn supports_credential_exchange(self) -> bool {
        matches!(self, Self::Ftp | Self::Smtp)
    }

    /// Plaintext-credential legacy protocols are high risk.
    pub fn risk(self) -> RiskTier {
        match self {
            Self::Ftp | Self::Telnet => RiskTier::High,
            _ => RiskTier::Medium,
        }
    }
}

impl fmt::Display for ServiceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reporting priority of a discovered service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Medium,
    High,
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Medium => f.write_str("Medium"),
            Self::High => f.write_str("High"),
        }
    }
}

/// Banner tokens that override the port table, checked in order.
const BANNER_TOKENS: &[(&str, ServiceLabel)] = &[
    ("ftp", ServiceLabel::Ftp),
    ("smtp", ServiceLabel::Smtp),
    ("ssh", ServiceLabel::Ssh),
];

/// Look up the conventional service for a port.
pub fn service_for_port(port: u16) -> ServiceLabel {
    match port {
        21 | 2121 => ServiceLabel::Ftp,
        22 => ServiceLabel::Ssh,
        23 => ServiceLabel::Telnet,
        25 | 465 | 587 => ServiceLabel::Smtp,
        53 => ServiceLabel::Dns,
        80 | 8080 => ServiceLabel::Http,
        443 | 8443 => ServiceLabel::Https,
        110 => ServiceLabel::Pop3,
        143 => ServiceLabel::Imap,
        993 => ServiceLabel::Imaps,
        995 => ServiceLabel::Pop3s,
        1433 => ServiceLabel::Mssql,
        1521 => ServiceLabel::Oracle,
        3306 => ServiceLabel::Mysql,
        3389 => ServiceLabel::Rdp,
        5432 => ServiceLabel::Postgresql,
        5900 => ServiceLabel::Vnc,
        27017 => ServiceLabel::Mongodb,
        _ => ServiceLabel::Unknown,
    }
}

/// Detect a protocol token in a banner (case-insensitive).
pub fn service_from_banner(banner: &str) -> Option<ServiceLabel> {
    let lower = banner.to_ascii_lowercase();
    BANNER_TOKENS
        .iter()
        .find(|(token, _)| lower.contains(token))
        .map(|&(_, label)| label)
}

/// Classify a port and optional banner into a label and risk tier.
pub fn classify(port: u16, banner: Option<&str>) -> (ServiceLabel, RiskTier) {
    let label = banner
        .and_then(service_from_banner)
        .unwrap_or_else(|| service_for_port(port));
    (label, label.risk())
}
