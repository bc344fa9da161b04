//! TOML configuration schema types.
//!
//! All structs derive `Deserialize` and `Serialize` with defaults via
//! `#[serde(default)]`, so a partial or empty file is valid.
//!
//! Duration fields use human-readable strings (e.g. `"10s"`, `"500ms"`)
//! parsed by the `humantime` crate when the engine options are built.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::config::xdg;
use crate::engine::EngineOptions;
use crate::gateway::SaveContext;
use crate::layout::{LayoutConfig, MAX_ANIMATION_DURATION_MS};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
///
/// ```toml
/// [portal]
/// [layout]
/// [layout.animation]
/// [persistence]
/// [logging]
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Which portal the CLI edits.
    pub portal: PortalConfig,
    /// Layout for new portals and for `reset`.
    pub layout: LayoutConfig,
    /// Where and how layouts are saved.
    pub persistence: PersistenceConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

impl Config {
    /// Checks values serde cannot: durations, ranges and empty ids.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.save_timeout()?;
        for (field, value) in [
            ("portal.job_id", &self.portal.job_id),
            ("portal.profile_id", &self.portal.profile_id),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field,
                    value: value.clone(),
                    message: "must not be empty".to_string(),
                });
            }
        }
        let ms = self.layout.animation.duration_ms;
        if ms > MAX_ANIMATION_DURATION_MS {
            return Err(ConfigError::InvalidValue {
                field: "layout.animation.duration_ms",
                value: ms.to_string(),
                message: format!("must be at most {}", MAX_ANIMATION_DURATION_MS),
            });
        }
        Ok(())
    }

    /// Parsed `persistence.save_timeout`. Empty or `"0s"` disables the timeout.
    pub fn save_timeout(&self) -> Result<Option<Duration>, ConfigError> {
        let raw = self.persistence.save_timeout.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        let timeout = humantime::parse_duration(raw).map_err(|e| ConfigError::InvalidValue {
            field: "persistence.save_timeout",
            value: raw.to_string(),
            message: e.to_string(),
        })?;
        Ok((!timeout.is_zero()).then_some(timeout))
    }

    /// Directory the JSON file gateway stores layouts under.
    pub fn store_dir(&self) -> PathBuf {
        let raw = self.persistence.store_dir.trim();
        if raw.is_empty() {
            xdg::data_dir()
        } else {
            xdg::expand_tilde(raw)
        }
    }

    /// The save context named by `[portal]`.
    pub fn context(&self) -> SaveContext {
        SaveContext::new(&self.portal.job_id, &self.portal.profile_id)
    }

    /// Engine options for the configured portal.
    pub fn engine_options(&self) -> Result<EngineOptions, ConfigError> {
        self.validate()?;
        Ok(EngineOptions {
            context: self.context(),
            default_layout: self.layout,
            save_timeout: self.save_timeout()?,
            ..EngineOptions::default()
        })
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// `[portal]`: the job and profile whose portal is edited.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PortalConfig {
    pub job_id: String,
    pub profile_id: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            job_id: "default".to_string(),
            profile_id: "default".to_string(),
        }
    }
}

/// `[persistence]`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Root directory for stored layouts. Empty uses the XDG data dir.
    /// Tilde (`~`) is expanded.
    pub store_dir: String,
    /// Upper bound on one save as a human-readable duration.
    pub save_timeout: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            store_dir: String::new(),
            save_timeout: "10s".to_string(),
        }
    }
}

/// `[logging]`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level used when `PORTAL_LOG` is unset.
    pub level: LogLevel,
}

/// Log verbosity levels (kebab-case in TOML).
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// The `EnvFilter` directive for this level.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
