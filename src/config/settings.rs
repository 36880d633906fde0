//! Engine settings and paths.
//!
//! Settings live in `settings.json` under the XDG config directory. A missing
//! file means defaults; a present but invalid file is an error.

use crate::error::{ConfigError, ConfigResult};
use crate::scheduler::AttackMode;
use crate::timing::{TimingConfig, TimingMode};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/sounder)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the per-user directories.
    pub fn discover() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "sounder", "sounder")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Tunables for one engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-connection timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum concurrently running jobs.
    pub concurrency: usize,
    /// Read a banner from open ports.
    pub grab_banner: bool,
    pub timing_mode: TimingMode,
    pub attack_mode: AttackMode,
    /// Upper bound on hosts enumerated from one range.
    pub max_hosts: usize,
    /// Number of leading passwords tried by a spray plan.
    pub spray_top_k: usize,
    pub liveness_timeout_ms: u64,
    pub banner_timeout_ms: u64,
    /// Probe dispatch rate per second, 0 for unlimited.
    pub max_rate: u32,
    /// Name sent with SMTP EHLO.
    pub smtp_helo: String,
    pub timing: TimingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 3000,
            concurrency: 100,
            grab_banner: true,
            timing_mode: TimingMode::default(),
            attack_mode: AttackMode::default(),
            max_hosts: 254,
            spray_top_k: 5,
            liveness_timeout_ms: 1000,
            banner_timeout_ms: 2000,
            max_rate: 0,
            smtp_helo: "localhost".to_string(),
            timing: TimingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load settings from the default location, falling back to defaults.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::discover()?.settings_file();

        if !file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }

    /// Reject configurations that cannot drive a run.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.concurrency == 0 {
            return Err(ConfigError::NonPositiveConcurrency);
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("connection"));
        }
        if self.liveness_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("liveness"));
        }
        if self.grab_banner && self.banner_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("banner"));
        }
        if self.spray_top_k == 0 {
            return Err(ConfigError::ZeroSprayWidth);
        }
        if self.max_hosts == 0 {
            return Err(ConfigError::ZeroHostCap);
        }
        self.timing.validate()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_millis(self.liveness_timeout_ms)
    }

    pub fn banner_timeout(&self) -> Duration {
        Duration::from_millis(self.banner_timeout_ms)
    }
}
