//! # Sounder - Network Reconnaissance and Credential Validation
//!
//! Sounder discovers live hosts, probes ports for open services, labels
//! them by protocol, and for FTP and SMTP checks whether any supplied
//! username/password candidate logs in. It is meant for authorized
//! assessments of infrastructure the operator controls.
//!
//! ## Features
//!
//! - **Flexible Targeting**: Single IPs, hostnames, and capped CIDR ranges
//! - **Liveness Sweeps**: `ping` with a TCP connect fallback
//! - **Bounded Concurrency**: Every job runs under one concurrency ceiling
//! - **Banner Grabbing**: Service identification on open ports
//! - **Credential Exchanges**: Table-driven FTP and SMTP AUTH LOGIN handshakes
//! - **Attack Plans**: Exhaustive or spray, paced by a timing policy
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use sounder::{AttemptScheduler, CredentialSource, EngineConfig, PortSpec, ResultStore};
//! use sounder::discovery::resolve_targets;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::default();
//!     let targets = resolve_targets(&["192.168.1.0/28"], &config, true).await?;
//!     let ports = PortSpec::mail().to_ports();
//!
//!     let scheduler = AttemptScheduler::new(config, ResultStore::new())?;
//!     let report = scheduler.run(&targets, &ports, &CredentialSource::builtin()).await;
//!
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Targets, ports, credentials and run ids
//! - [`discovery`] - Target resolution and liveness sweeps
//! - [`scanner`] - TCP connect probing with bounded concurrency
//! - [`services`] - Port and banner classification
//! - [`auth`] - FTP and SMTP credential exchanges
//! - [`timing`] - Delay policies between attempts
//! - [`scheduler`] - Attempt plans and the job dispatcher
//! - [`store`] - Shared findings store with a live feed
//! - [`config`] - Engine settings
//! - [`error`] - Error types

pub mod auth;
pub mod banner;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod scanner;
pub mod scheduler;
pub mod services;
pub mod store;
pub mod timing;
pub mod types;

// Re-export commonly used types
pub use auth::{AttemptRecord, CredentialExchange, ExchangeOutcome, Protocol};
pub use config::EngineConfig;
pub use error::{CliError, ConfigError, EngineError, TargetError};
pub use scanner::{ProbeResult, Prober, TcpProber};
pub use scheduler::{AttackMode, AttemptScheduler, BatchSummary, ScanReport};
pub use services::{classify, RiskTier, ServiceLabel};
pub use store::{Finding, ResultStore};
pub use timing::{TimingMode, TimingPolicy};
pub use types::{Credential, CredentialSource, Port, PortSpec, RunId, Target, TargetSpec};
