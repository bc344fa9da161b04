//! Default configuration template and file creation.
//!
//! The template matches `Config::default()` and documents every option.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::error::ConfigError;
use crate::config::xdg;

/// A commented TOML template with all default values.
///
/// Every value here must match `Config::default()` from `schema.rs`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Portal Sections Configuration
#
# All values shown below are the built-in defaults.
# Location: $XDG_CONFIG_HOME/portal-sections/config.toml

# ==============================================================================
# Portal
# ==============================================================================

[portal]

# Job and profile whose portal the CLI edits.
job_id = "default"
profile_id = "default"

# ==============================================================================
# Layout
# ==============================================================================

# Layout for new portals and for `portal-sections reset`.
[layout]

# Options: "vertical", "horizontal", "grid", "masonry"
layout = "vertical"

# Gap between sections.
# Options: "compact", "normal", "relaxed"
spacing = "normal"

[layout.animation]
enabled = true

# Transition length in milliseconds (0 to 10000).
duration_ms = 300

# ==============================================================================
# Persistence
# ==============================================================================

[persistence]

# Directory stored layouts are written under, one JSON file per portal.
# Empty means $XDG_DATA_HOME/portal-sections. Tilde (~) is expanded.
store_dir = ""

# Give up on a save after this long. Local edits are kept.
# Examples: "10s", "500ms", "1m". "0s" waits indefinitely.
save_timeout = "10s"

# ==============================================================================
# Logging
# ==============================================================================

[logging]

# Used when PORTAL_LOG is unset.
# Options: "error", "warn", "info", "debug", "trace"
level = "warn"
"#;

/// Writes the default template to `path`, or to the XDG config path when
/// `path` is `None`.
///
/// - If the file exists and `force` is `false`, returns `ConfigError::AlreadyExists`.
/// - If the file exists and `force` is `true`, backs it up to `.toml.backup` first.
/// - Returns the path where the config was written.
pub fn create_default_config(path: Option<&Path>, force: bool) -> Result<PathBuf, ConfigError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(xdg::config_path);

    if path.exists() {
        if !force {
            return Err(ConfigError::AlreadyExists { path });
        }
        let backup_path = path.with_extension("toml.backup");
        fs::rename(&path, &backup_path).map_err(|e| ConfigError::WriteError {
            path: backup_path.clone(),
            source: e,
        })?;
        tracing::info!("Backed up existing config to {}", backup_path.display());
    }

    write_default_config(&path)?;
    tracing::info!("Created default configuration at {}", path.display());
    Ok(path)
}

/// Writes the template to `path`, creating parent dirs and setting 0600 permissions.
fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let write_error = |e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        xdg::ensure_dir(parent).map_err(write_error)?;
    }
    fs::write(path, DEFAULT_CONFIG_TEMPLATE).map_err(write_error)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(write_error)?;
    }
    Ok(())
}
