//! Portal Sections - CLI entry point
//!
//! Edits the section layout of one portal stored on local disk. Every
//! mutating command opens the stored layout, applies one operation and
//! saves it back.

use clap::{Parser, Subcommand};
use portal_sections::config::{default, xdg, Config, ConfigLoader, LogLevel};
use portal_sections::{
    logging, render, Change, JsonFileGateway, LayoutConfigPatch, LayoutKind, SectionCollection,
    SectionError, SectionId, SectionLayoutEngine, SectionType, SectionTypeRegistry, Spacing,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

/// Portal section layout editor
#[derive(Parser)]
#[command(name = "portal-sections")]
#[command(version, about = "Edit the section layout of a candidate portal")]
struct Cli {
    /// Configuration file (default: $XDG_CONFIG_HOME/portal-sections/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory stored layouts live under (overrides persistence.store_dir)
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// Job id of the portal (overrides portal.job_id)
    #[arg(long, global = true)]
    job: Option<String>,

    /// Profile id of the portal (overrides portal.profile_id)
    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// List the portal's sections in order
    Show {
        /// Print the stored layout and status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render the visible sections as text
    Preview {
        /// Line width in columns
        #[arg(long, default_value_t = 80)]
        width: u16,
    },

    /// Move a visible section (indices count visible sections only)
    Move {
        /// Current position among visible sections
        from: usize,
        /// Target position among visible sections
        to: usize,
    },

    /// Hide a section
    Hide {
        /// Section id, or a type that appears once (e.g. "skills")
        section: String,
    },

    /// Show a hidden section again
    Reveal {
        /// Section id, or a type that appears once
        section: String,
    },

    /// Append a new section
    Add {
        /// Section type (see `types`)
        section_type: SectionType,
    },

    /// Delete a section
    Delete {
        /// Section id, or a type that appears once
        section: String,
    },

    /// Set or clear a section's display name
    Rename {
        /// Section id, or a type that appears once
        section: String,
        /// New name; omit to restore the default name
        name: Option<String>,
    },

    /// Replace a section's data or customization payload
    Edit {
        /// Section id, or a type that appears once
        section: String,
        /// New data payload as JSON
        #[arg(long)]
        data: Option<String>,
        /// New customization payload as JSON
        #[arg(long)]
        customization: Option<String>,
    },

    /// Change layout preferences
    Layout {
        /// vertical, horizontal, grid or masonry
        #[arg(long)]
        layout: Option<LayoutKind>,
        /// compact, normal or relaxed
        #[arg(long)]
        spacing: Option<Spacing>,
        /// Enable or disable transitions
        #[arg(long)]
        animation: Option<bool>,
        /// Transition length in milliseconds
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=10_000))]
        duration: Option<u32>,
    },

    /// Replace all sections and layout with the defaults
    Reset,

    /// List section types
    Types,

    /// Manage configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Actions for the `config` subcommand.
#[derive(Subcommand)]
enum ConfigAction {
    /// Create default configuration file
    Init {
        /// Overwrite existing configuration (creates backup)
        #[arg(long)]
        force: bool,
    },
    /// Show configuration file path
    Path,
    /// Validate configuration file
    Validate,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Commands::Config { action } = &cli.command {
        logging::init(LogLevel::default());
        return run_config_command(cli.config.as_deref(), action);
    }
    if let Commands::Types = cli.command {
        print_types(&SectionTypeRegistry::builtin());
        return ExitCode::SUCCESS;
    }

    let mut config = match ConfigLoader::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(config.logging.level);
    if let Some(job) = cli.job {
        config.portal.job_id = job;
    }
    if let Some(profile) = cli.profile {
        config.portal.profile_id = profile;
    }
    let store_dir = cli.store_dir.unwrap_or_else(|| config.store_dir());

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };
    rt.block_on(run_portal_command(&config, store_dir, cli.command))
}

fn run_config_command(path: Option<&Path>, action: &ConfigAction) -> ExitCode {
    let result = match action {
        ConfigAction::Init { force } => default::create_default_config(path, *force).map(|path| {
            println!("Created configuration at {}", path.display());
        }),
        ConfigAction::Path => {
            let path = path.map(Path::to_path_buf).unwrap_or_else(xdg::config_path);
            println!("{}", path.display());
            Ok(())
        }
        ConfigAction::Validate => ConfigLoader::load(path)
            .and_then(|config| config.validate().map(|()| config))
            .map(|config| {
                println!("Configuration is valid");
                println!("{config:#?}");
            }),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Config error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_portal_command(config: &Config, store_dir: PathBuf, command: Commands) -> ExitCode {
    let options = match config.engine_options() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Config error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let gateway = Arc::new(JsonFileGateway::new(store_dir));
    let engine = match SectionLayoutEngine::open(gateway, options).await {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = match command {
        Commands::Show { json } => {
            return print_show(&engine, json);
        }
        Commands::Preview { width } => {
            let lines = render::render_portal(
                &engine.collection(),
                &engine.layout_config(),
                engine.registry(),
                &render::RendererRegistry::new(),
                width,
            );
            for line in lines {
                let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
                println!("{}", text);
            }
            return ExitCode::SUCCESS;
        }
        Commands::Move { from, to } => Ok(engine.move_section(from, to)),
        Commands::Hide { section } => {
            with_target(&engine, &section, |id| engine.toggle_visibility(id, false))
        }
        Commands::Reveal { section } => {
            with_target(&engine, &section, |id| engine.toggle_visibility(id, true))
        }
        Commands::Add { section_type } => engine.add_section(section_type).map(|id| {
            println!("Added {}", id);
            Change::Applied
        }),
        Commands::Delete { section } => {
            with_target(&engine, &section, |id| engine.delete_section(id))
        }
        Commands::Rename { section, name } => {
            with_target(&engine, &section, |id| engine.rename_section(id, name))
        }
        Commands::Edit {
            section,
            data,
            customization,
        } => {
            if data.is_none() && customization.is_none() {
                eprintln!("Error: nothing to edit, pass --data or --customization");
                return ExitCode::FAILURE;
            }
            let data = match parse_json("--data", data) {
                Ok(v) => v,
                Err(code) => return code,
            };
            let customization = match parse_json("--customization", customization) {
                Ok(v) => v,
                Err(code) => return code,
            };
            with_target(&engine, &section, |id| {
                let mut change = Change::Unchanged;
                if let Some(data) = data {
                    if engine.edit_section_data(id, data)? == Change::Applied {
                        change = Change::Applied;
                    }
                }
                if let Some(customization) = customization {
                    if engine.edit_section_customization(id, customization)? == Change::Applied {
                        change = Change::Applied;
                    }
                }
                Ok(change)
            })
        }
        Commands::Layout {
            layout,
            spacing,
            animation,
            duration,
        } => {
            let patch = LayoutConfigPatch {
                layout,
                spacing,
                animation_enabled: animation,
                animation_duration_ms: duration,
            };
            if patch.is_empty() {
                let cfg = engine.layout_config();
                println!(
                    "layout={} spacing={} animation={} duration={}ms",
                    cfg.layout, cfg.spacing, cfg.animation.enabled, cfg.animation.duration_ms
                );
                return ExitCode::SUCCESS;
            }
            Ok(engine.set_layout_config(patch))
        }
        Commands::Reset => {
            engine.reset();
            Ok(Change::Applied)
        }
        Commands::Types | Commands::Config { .. } => return ExitCode::SUCCESS,
    };

    match outcome {
        Ok(Change::Unchanged) => {
            println!("No change");
            ExitCode::SUCCESS
        }
        Ok(Change::Applied) => match engine.save().await {
            Ok(state) => {
                println!(
                    "Saved {} sections ({})",
                    state.collection.len(),
                    state.status()
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Resolves `arg` to a section id and runs `op` on it.
fn with_target(
    engine: &SectionLayoutEngine,
    arg: &str,
    op: impl FnOnce(&SectionId) -> Result<Change, SectionError>,
) -> Result<Change, SectionError> {
    let id = resolve_section(&engine.collection(), arg)?;
    op(&id)
}

/// Accepts a section id, or a section type that occurs exactly once.
fn resolve_section(collection: &SectionCollection, arg: &str) -> Result<SectionId, SectionError> {
    let id = SectionId::from(arg);
    if collection.contains(&id) {
        return Ok(id);
    }
    if let Ok(section_type) = arg.parse::<SectionType>() {
        let mut matches = collection.iter().filter(|s| s.section_type == section_type);
        if let (Some(section), None) = (matches.next(), matches.next()) {
            return Ok(section.id.clone());
        }
    }
    Err(SectionError::NotFound { id })
}

fn parse_json(flag: &str, raw: Option<String>) -> Result<Option<Value>, ExitCode> {
    match raw.map(|s| serde_json::from_str::<Value>(&s)).transpose() {
        Ok(value) => Ok(value),
        Err(e) => {
            eprintln!("Error: {flag} is not valid JSON: {e}");
            Err(ExitCode::FAILURE)
        }
    }
}

fn print_show(engine: &SectionLayoutEngine, json: bool) -> ExitCode {
    let state = engine.state();
    if json {
        let doc = serde_json::json!({
            "context": engine.context(),
            "status": state.status(),
            "layout_config": state.layout_config,
            "sections": state.collection,
        });
        return match serde_json::to_string_pretty(&doc) {
            Ok(s) => {
                println!("{}", s);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let context = engine.context();
    println!(
        "Portal {}/{} ({})",
        context.profile_id,
        context.job_id,
        state.status()
    );
    for section in &state.collection {
        println!(
            "{:>3}  {:<6}  {:<14}  {}  [{}]",
            section.order,
            if section.visible { "shown" } else { "hidden" },
            section.section_type,
            section.label(engine.registry()),
            section.id
        );
    }
    ExitCode::SUCCESS
}

fn print_types(registry: &SectionTypeRegistry) {
    for entry in registry.entries() {
        let mut flags = Vec::new();
        if entry.required {
            flags.push("required");
        }
        if entry.default_visible {
            flags.push("default");
        }
        if entry.section_type.allows_multiple() {
            flags.push("multiple");
        }
        println!(
            "{:<14}  {:<22}  {}{}",
            entry.section_type,
            entry.display_name,
            entry.description,
            if flags.is_empty() {
                String::new()
            } else {
                format!(" ({})", flags.join(", "))
            }
        );
    }
}
