//! Configuration for the `portal-sections` CLI.
//!
//! A TOML file at `$XDG_CONFIG_HOME/portal-sections/config.toml` selects the
//! portal being edited, the default layout, where layouts are stored, and
//! the log level. Every table is optional.

/// Default configuration template and file creation.
pub mod default;

/// Configuration error types.
pub mod error;

/// Configuration file loader.
pub mod loader;

/// TOML configuration schema types.
pub mod schema;

/// XDG Base Directory path resolution utilities.
pub mod xdg;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{Config, LogLevel};
