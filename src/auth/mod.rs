//! Credential exchanges for plaintext legacy protocols.
//!
//! Each protocol is a `machine::StateMachine` table plus a small
//! `CredentialExchange` impl that renders its commands.

pub mod ftp;
pub mod machine;
pub mod smtp;

use crate::services::ServiceLabel;
use crate::types::{Credential, Port, Target};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

pub use ftp::FtpExchange;
pub use machine::{ExchangeOutcome, StateMachine, Transition};
pub use smtp::SmtpExchange;

/// Protocols with a credential exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Ftp,
    Smtp,
}

impl Protocol {
    pub fn default_port(self) -> u16 {
        match self {
            Self::Ftp => 21,
            Self::Smtp => 25,
        }
    }

    /// The protocol that handles a classified service, if any.
    pub fn for_service(label: ServiceLabel) -> Option<Self> {
        match label {
            ServiceLabel::Ftp => Some(Self::Ftp),
            ServiceLabel::Smtp => Some(Self::Smtp),
            _ => None,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ftp => write!(f, "ftp"),
            Self::Smtp => write!(f, "smtp"),
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ftp" => Ok(Self::Ftp),
            "smtp" => Ok(Self::Smtp),
            _ => Err(format!("unsupported protocol: {}", s)),
        }
    }
}

/// One credential attempt as recorded in the result store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptRecord {
    pub protocol: Protocol,
    pub target: Target,
    pub port: Port,
    pub credential: Credential,
    pub succeeded: bool,
    pub timestamp: DateTime<Utc>,
    /// Attack and timing mode that produced the attempt, e.g. `spray/business-aware`.
    pub technique: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
}

impl AttemptRecord {
    pub fn from_outcome(
        protocol: Protocol,
        target: Target,
        port: Port,
        credential: Credential,
        technique: impl Into<String>,
        outcome: ExchangeOutcome,
    ) -> Self {
        Self {
            protocol,
            target,
            port,
            credential,
            succeeded: outcome.succeeded,
            timestamp: Utc::now(),
            technique: technique.into(),
            banner: outcome.banner,
        }
    }
}

/// A scripted login against one protocol.
///
/// Attempts never fail outright: connection problems and protocol deviations
/// come back as an unsuccessful outcome with the reason attached.
#[async_trait]
pub trait CredentialExchange: Send + Sync {
    fn protocol(&self) -> Protocol;

    async fn attempt(&self, addr: SocketAddr, credential: &Credential) -> ExchangeOutcome;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_mapping() {
        assert_eq!(Protocol::for_service(ServiceLabel::Ftp), Some(Protocol::Ftp));
        assert_eq!(Protocol::for_service(ServiceLabel::Smtp), Some(Protocol::Smtp));
        assert_eq!(Protocol::for_service(ServiceLabel::Ssh), None);
        assert_eq!(Protocol::Smtp.default_port(), 25);
        assert_eq!("FTP".parse::<Protocol>().unwrap(), Protocol::Ftp);
        assert!("ssh".parse::<Protocol>().is_err());
    }

    #[test]
    fn test_record_carries_outcome() {
        let target = Target::new("10.0.0.5", "10.0.0.5".parse().unwrap(), true);
        let outcome = ExchangeOutcome {
            succeeded: true,
            banner: Some("220 ready".to_string()),
            final_state: "Authenticated".to_string(),
            rejection: None,
        };
        let record = AttemptRecord::from_outcome(
            Protocol::Ftp,
            target,
            Port::new(21).unwrap(),
            Credential::new("admin", "secret"),
            "exhaustive/steady",
            outcome,
        );
        assert!(record.succeeded);
        assert_eq!(record.banner.as_deref(), Some("220 ready"));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["protocol"], "ftp");
        assert_eq!(json["technique"], "exhaustive/steady");
    }
}
