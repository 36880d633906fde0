//! Attack subcommand implementation.
//!
//! Handles `sounder attack <target> --protocol ftp|smtp`, which runs the
//! credential plan against a known endpoint without probing first.

use super::{emit_report, CredentialArgs};
use crate::auth::Protocol;
use crate::config::EngineConfig;
use crate::discovery::resolve_targets;
use crate::error::{CliError, CliResult};
use crate::scheduler::{AttackMode, AttemptScheduler};
use crate::store::ResultStore;
use crate::timing::TimingMode;
use crate::types::Port;
use clap::Parser;
use tracing::info;

/// Try credentials against an FTP or SMTP endpoint.
#[derive(Parser, Debug)]
pub struct AttackCommand {
    /// Target host (IP, hostname, or CIDR notation)
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Protocol to authenticate against
    #[arg(long, value_enum)]
    pub protocol: Protocol,

    /// Port (defaults to 21 for FTP, 25 for SMTP)
    #[arg(long)]
    pub port: Option<u16>,

    /// How credential pairs are drawn
    #[arg(long, value_enum)]
    pub mode: Option<AttackMode>,

    /// Delay strategy between attempts
    #[arg(long, value_enum)]
    pub timing: Option<TimingMode>,

    /// Passwords tried per user in spray mode
    #[arg(long, value_name = "K")]
    pub spray_width: Option<usize>,

    /// Maximum number of concurrent attempts
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Per-connection timeout in milliseconds
    #[arg(short = 't', long)]
    pub timeout: Option<u64>,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

impl AttackCommand {
    fn apply(&self, mut config: EngineConfig) -> EngineConfig {
        if let Some(mode) = self.mode {
            config.attack_mode = mode;
        }
        if let Some(timing) = self.timing {
            config.timing_mode = timing;
        }
        if let Some(width) = self.spray_width {
            config.spray_top_k = width;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_ms = timeout;
        }
        config
    }

    fn port(&self) -> CliResult<Port> {
        let raw = self.port.unwrap_or_else(|| self.protocol.default_port());
        Port::new(raw).ok_or_else(|| CliError::Other(format!("invalid port: {}", raw)))
    }

    /// Execute the attack command.
    pub async fn execute(&self, config: EngineConfig, _verbose: bool, quiet: bool) -> CliResult<()> {
        let config = self.apply(config);
        let port = self.port()?;
        let credentials = self.credentials.load()?;

        let targets = resolve_targets(&[self.target.as_str()], &config, false).await?;
        info!(
            targets = targets.len(),
            protocol = %self.protocol,
            %port,
            mode = %config.attack_mode,
            "starting credential run"
        );

        let scheduler = AttemptScheduler::new(config, ResultStore::new())?;
        let report = scheduler
            .run_attack(&targets, self.protocol, port, &credentials)
            .await;

        emit_report(&report, quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(args: &[&str]) -> AttackCommand {
        let mut argv = vec!["attack"];
        argv.extend_from_slice(args);
        AttackCommand::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_default_port_follows_protocol() {
        assert_eq!(command(&["10.0.0.1", "--protocol", "ftp"]).port().unwrap().as_u16(), 21);
        assert_eq!(command(&["10.0.0.1", "--protocol", "smtp"]).port().unwrap().as_u16(), 25);
        assert_eq!(
            command(&["10.0.0.1", "--protocol", "smtp", "--port", "587"])
                .port()
                .unwrap()
                .as_u16(),
            587
        );
        assert!(command(&["10.0.0.1", "--protocol", "ftp", "--port", "0"]).port().is_err());
    }

    #[test]
    fn test_overrides_apply() {
        let cmd = command(&[
            "10.0.0.1", "--protocol", "ftp", "--mode", "spray", "--timing", "spray",
            "--spray-width", "3",
        ]);
        let config = cmd.apply(EngineConfig::default());
        assert_eq!(config.attack_mode, AttackMode::Spray);
        assert_eq!(config.timing_mode, TimingMode::Spray);
        assert_eq!(config.spray_top_k, 3);
    }
}
