//! Scan subcommand implementation.
//!
//! Handles `sounder scan <target>`: resolve, optionally sweep, probe, and
//! with `--attack` try credentials against every FTP or SMTP port found.

use super::{emit_report, CredentialArgs};
use crate::config::EngineConfig;
use crate::discovery::resolve_targets;
use crate::error::{CliError, CliResult};
use crate::scheduler::AttemptScheduler;
use crate::store::ResultStore;
use crate::types::{CredentialSource, PortSpec};
use clap::Parser;
use tracing::info;

/// Probe a target for open services.
#[derive(Parser, Debug)]
pub struct ScanCommand {
    /// Target to scan (IP, hostname, or CIDR notation)
    ///
    /// Examples:
    ///   192.168.1.1        Single IP address
    ///   mail.example.com   Hostname
    ///   192.168.1.0/24     CIDR range
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Ports to probe (e.g. "21", "21,25", "1-1024", or a preset:
    /// common, web, file, mail, database, remote)
    #[arg(short, long, default_value = "common")]
    pub ports: String,

    /// Maximum number of concurrent jobs
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Connection timeout in milliseconds
    #[arg(short = 't', long)]
    pub timeout: Option<u64>,

    /// Read a banner from open ports (overrides the settings file)
    #[arg(short = 'b', long)]
    pub banner: bool,

    /// Skip banner reads on open ports
    #[arg(long, conflicts_with_all = ["banner", "attack"])]
    pub no_banner: bool,

    /// Only probe range members that answer a liveness check
    #[arg(long)]
    pub sweep: bool,

    /// Probe rate limit per second (0 = unlimited)
    #[arg(short = 'r', long = "rate")]
    pub rate_limit: Option<u32>,

    /// Try credentials against open FTP and SMTP ports
    #[arg(long)]
    pub attack: bool,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

impl ScanCommand {
    /// Apply command-line overrides on top of loaded settings.
    fn apply(&self, mut config: EngineConfig) -> EngineConfig {
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_ms = timeout;
        }
        if let Some(rate) = self.rate_limit {
            config.max_rate = rate;
        }
        if self.banner || self.attack {
            config.grab_banner = true;
        } else if self.no_banner {
            config.grab_banner = false;
        }
        config
    }

    /// Execute the scan command.
    pub async fn execute(&self, config: EngineConfig, verbose: bool, quiet: bool) -> CliResult<()> {
        let config = self.apply(config);

        let port_spec: PortSpec = self.ports.parse()?;
        let ports = port_spec.to_ports();
        if ports.is_empty() {
            return Err(CliError::Other("No valid ports specified".to_string()));
        }

        let credentials = if self.attack {
            self.credentials.load()?
        } else {
            CredentialSource::default()
        };

        let targets = resolve_targets(&[self.target.as_str()], &config, self.sweep).await?;
        if targets.is_empty() {
            return Err(CliError::Other("No live targets found".to_string()));
        }
        info!(targets = targets.len(), ports = ports.len(), "starting scan");

        let scheduler = AttemptScheduler::new(config, ResultStore::new())?
            .with_progress(verbose && !quiet);
        let report = scheduler.run(&targets, &ports, &credentials).await;

        emit_report(&report, quiet)
    }
}
