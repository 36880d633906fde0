//! Error types for Sounder.
//!
//! Uses `thiserror` for ergonomic error definitions. Only malformed input
//! (`TargetError`, `ConfigError`) ever reaches a caller; network failures are
//! absorbed into negative probe and attempt results.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub use crate::types::{PortError, TargetError};

/// Why a TCP connection could not be established.
///
/// Converted into `open = false` by the prober and never returned from
/// public APIs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionFailure {
    #[error("connection timed out")]
    Timeout,

    #[error("connection refused")]
    Refused,

    #[error("host or network unreachable: {0}")]
    Unreachable(String),

    #[error("connection failed: {0}")]
    Other(String),
}

impl ConnectionFailure {
    /// Classify an I/O error raised by `connect`.
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => Self::Refused,
            io::ErrorKind::TimedOut => Self::Timeout,
            _ => {
                let text = err.to_string();
                if text.to_lowercase().contains("unreachable") {
                    Self::Unreachable(text)
                } else {
                    Self::Other(text)
                }
            }
        }
    }

    /// A refusal still proves that a host is up.
    pub fn proves_host_alive(&self) -> bool {
        matches!(self, Self::Refused)
    }
}

/// Why a credential exchange ended in the rejected state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolRejection {
    #[error("server replied {code}")]
    UnexpectedReply { code: u16 },

    #[error("malformed reply: {0}")]
    MalformedReply(String),

    #[error("exchange timed out")]
    Timeout,

    #[error("connection closed by server")]
    Closed,

    #[error("connection failed: {0}")]
    Connect(ConnectionFailure),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("no transition defined from state {0}")]
    NoTransition(String),

    #[error("command would contain a line break")]
    LineBreak,
}

/// Invalid engine configuration. Raised before any work starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid port specification: {0}")]
    InvalidPorts(#[from] PortError),

    #[error("concurrency must be greater than zero")]
    NonPositiveConcurrency,

    #[error("{0} timeout must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("invalid {name} delay range: {low_ms}ms > {high_ms}ms")]
    InvalidDelayRange {
        name: &'static str,
        low_ms: u64,
        high_ms: u64,
    },

    #[error("invalid business window: {start}..={end} (hours must be 0-23, start <= end)")]
    InvalidBusinessWindow { start: u32, end: u32 },

    #[error("spray width must be greater than zero")]
    ZeroSprayWidth,

    #[error("host cap must be greater than zero")]
    ZeroHostCap,

    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read config file {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid config format: {0}")]
    InvalidFormat(String),
}

/// Errors surfaced by the library entry points.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("target error: {0}")]
    Target(#[from] TargetError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("port error: {0}")]
    Port(#[from] PortError),
}

/// CLI-specific errors.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Engine(#[from] EngineError),

    #[error("{0}")]
    Target(#[from] TargetError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Port(#[from] PortError),

    #[error("failed to read wordlist {path}: {reason}")]
    Wordlist { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
