//! Configuration storage

use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_WEBHOOK_BASE: &str = "https://your-n8n-instance.com/webhook";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Roster webhook (GET)
    pub users_url: String,
    /// Absence requests webhook (GET)
    pub absences_url: String,
    /// Absence decision webhook (POST)
    pub update_status_url: String,
    /// Roster save/delete webhook (POST, `action` field selects the operation)
    pub manage_user_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Wall-clock zone of the team, in minutes east of UTC (Brasília is -180)
    pub utc_offset_minutes: i32,
    /// Clock tick for the dashboard, in seconds
    pub tick_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            users_url: format!("{}/get-users", DEFAULT_WEBHOOK_BASE),
            absences_url: format!("{}/get-absence-data", DEFAULT_WEBHOOK_BASE),
            update_status_url: format!("{}/update-absence-status", DEFAULT_WEBHOOK_BASE),
            manage_user_url: format!("{}/manage-user", DEFAULT_WEBHOOK_BASE),
            request_timeout_secs: 15,
            utc_offset_minutes: -180,
            tick_secs: 60,
        }
    }
}

impl Config {
    /// Default config file path
    pub fn default_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "squad-board", "squad-board")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Resolve an explicit path or fall back to the default location.
    pub fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(p.to_path_buf()),
            None => Self::default_path(),
        }
    }

    /// Load configuration from disk. A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_path(path)?;

        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = Self::resolve_path(path)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, content).context("Failed to write config file")?;
        Ok(path)
    }

    /// Reject values the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("users_url", &self.users_url),
            ("absences_url", &self.absences_url),
            ("update_status_url", &self.update_status_url),
            ("manage_user_url", &self.manage_user_url),
        ] {
            url::Url::parse(value).with_context(|| format!("Invalid {}: {}", key, value))?;
        }
        if self.tick_secs == 0 {
            bail!("tick_secs must be at least 1");
        }
        self.offset()?;
        Ok(())
    }

    /// The team's fixed UTC offset.
    pub fn offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .with_context(|| format!("Invalid utc_offset_minutes: {}", self.utc_offset_minutes))
    }

    /// Current instant in the team's zone. Falls back to UTC on a bad offset.
    pub fn now(&self) -> DateTime<FixedOffset> {
        let offset = self.offset().unwrap_or_else(|_| Utc.fix());
        Utc::now().with_timezone(&offset)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_secs.max(1))
    }
}
