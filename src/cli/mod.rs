//! CLI subcommand definitions and handlers.
//!
//! - `sounder scan <target>` - Probe a target, optionally trying credentials
//! - `sounder attack <target> --protocol ftp|smtp` - Try credentials directly

mod attack;
mod scan;

pub use attack::AttackCommand;
pub use scan::ScanCommand;

use crate::config::EngineConfig;
use crate::error::{CliError, CliResult};
use crate::scheduler::ScanReport;
use crate::types::CredentialSource;
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

/// Sounder - network reconnaissance and credential validation.
///
/// Discovers live hosts, probes ports, identifies services and checks
/// FTP and SMTP logins against supplied candidates. Only use it against
/// infrastructure you are authorized to assess.
#[derive(Parser, Debug)]
#[command(name = "sounder")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Network reconnaissance and credential validation", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a settings file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Load engine settings from `--config` or the default location.
    pub fn load_config(&self) -> CliResult<EngineConfig> {
        let config = match &self.config {
            Some(path) => EngineConfig::load_from(path)?,
            None => EngineConfig::load()?,
        };
        Ok(config)
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe a target for open services
    #[command(alias = "s")]
    Scan(ScanCommand),

    /// Try credentials against a known FTP or SMTP endpoint
    #[command(alias = "a")]
    Attack(AttackCommand),
}

/// Where credential candidates come from.
#[derive(Args, Debug, Clone, Default)]
pub struct CredentialArgs {
    /// Username wordlist, one per line
    #[arg(long, value_name = "FILE")]
    pub users: Option<PathBuf>,

    /// Password wordlist, one per line
    #[arg(long, value_name = "FILE")]
    pub passwords: Option<PathBuf>,

    /// File of user:password lines (overrides --users/--passwords)
    #[arg(long, value_name = "FILE")]
    pub pairs: Option<PathBuf>,
}

impl CredentialArgs {
    /// Build the candidate lists, using the built-in defaults for any list
    /// not given on the command line.
    pub fn load(&self) -> CliResult<CredentialSource> {
        if let Some(path) = &self.pairs {
            return Ok(CredentialSource::from_pairs(&read_wordlist(path)?));
        }

        let builtin = CredentialSource::builtin();
        let users = match &self.users {
            Some(path) => read_wordlist(path)?,
            None => builtin.users().join("\n"),
        };
        let passwords = match &self.passwords {
            Some(path) => read_wordlist(path)?,
            None => builtin.passwords().join("\n"),
        };
        let source = CredentialSource::from_wordlists(&users, &passwords);

        if source.is_empty() {
            return Err(CliError::Other("no credential candidates loaded".to_string()));
        }
        Ok(source)
    }
}

fn read_wordlist(path: &Path) -> CliResult<String> {
    fs::read_to_string(path).map_err(|e| CliError::Wordlist {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Print the report as JSON on stdout and a summary on stderr.
pub(crate) fn emit_report(report: &ScanReport, quiet: bool) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    if !quiet {
        eprintln!("{}", report.summary());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_scan_command() {
        let cli = Cli::try_parse_from([
            "sounder", "scan", "10.0.0.0/30", "-p", "21,25", "-c", "8", "--sweep",
        ])
        .unwrap();
        match cli.command {
            Commands::Scan(cmd) => {
                assert_eq!(cmd.target, "10.0.0.0/30");
                assert_eq!(cmd.ports, "21,25");
                assert_eq!(cmd.concurrency, Some(8));
                assert!(cmd.sweep);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_attack_command() {
        let cli = Cli::try_parse_from([
            "sounder", "-v", "attack", "mail.example.com", "--protocol", "smtp", "--mode",
            "spray", "--timing", "business-aware",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Attack(cmd) => {
                assert_eq!(cmd.protocol, crate::auth::Protocol::Smtp);
                assert_eq!(cmd.mode, Some(crate::scheduler::AttackMode::Spray));
                assert_eq!(cmd.timing, Some(crate::timing::TimingMode::BusinessAware));
                assert!(cmd.port.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_attack_requires_protocol() {
        assert!(Cli::try_parse_from(["sounder", "attack", "10.0.0.1"]).is_err());
    }

    #[test]
    fn test_credentials_from_files() {
        let mut users = tempfile::NamedTempFile::new().unwrap();
        writeln!(users, "admin\n# comment\nroot\nadmin").unwrap();
        let mut passwords = tempfile::NamedTempFile::new().unwrap();
        writeln!(passwords, "secret").unwrap();

        let args = CredentialArgs {
            users: Some(users.path().to_path_buf()),
            passwords: Some(passwords.path().to_path_buf()),
            pairs: None,
        };
        let source = args.load().unwrap();
        assert_eq!(source.users(), ["admin", "root"]);
        assert_eq!(source.passwords(), ["secret"]);
    }

    #[test]
    fn test_missing_wordlist_is_reported() {
        let args = CredentialArgs {
            users: Some(PathBuf::from("/nonexistent/users.txt")),
            ..CredentialArgs::default()
        };
        assert!(matches!(args.load(), Err(CliError::Wordlist { .. })));
    }

    #[test]
    fn test_defaults_fill_missing_lists() {
        let source = CredentialArgs::default().load().unwrap();
        assert_eq!(source, CredentialSource::builtin());
    }
}
