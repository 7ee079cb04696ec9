mod commands;

use std::net::IpAddr;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use cssloader::catalog::ThemeQuery;

// ============================================================================
// CLI Types
// ============================================================================

/// cssloader - Theme manager daemon with scheduled preset changes
#[derive(Parser, Debug)]
#[command(version = cssloader::build_info::VERSION, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by commands that talk to a running daemon.
#[derive(Args, Debug)]
struct DaemonArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "cssloader.yaml", global = true)]
    config: String,

    /// Connect to a specific server URL instead of the configured port
    #[arg(short, long, global = true)]
    server: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage the HTTP server
    Serve {
        #[command(subcommand)]
        action: Option<ServeAction>,

        /// Path to configuration file
        #[arg(short, long, default_value = "cssloader.yaml", global = true)]
        config: String,

        /// Host to bind to (overrides config file)
        #[arg(long, global = true)]
        host: Option<IpAddr>,

        /// Port to listen on (overrides config file)
        #[arg(short, long, global = true)]
        port: Option<u16>,
    },

    /// Manage scheduled preset changes
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,

        #[command(flatten)]
        daemon: DaemonArgs,
    },

    /// List, apply or create presets
    Presets {
        #[command(subcommand)]
        action: PresetsAction,

        #[command(flatten)]
        daemon: DaemonArgs,
    },

    /// Manage installed themes
    Themes {
        #[command(subcommand)]
        action: ThemesAction,

        #[command(flatten)]
        daemon: DaemonArgs,
    },

    /// Browse the remote theme catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,

        /// Path to configuration file
        #[arg(short, long, default_value = "cssloader.yaml", global = true)]
        config: String,
    },
}

#[derive(Subcommand, Debug)]
enum ServeAction {
    /// Stop a running server
    Stop,
}

#[derive(Subcommand, Debug)]
enum ScheduleAction {
    /// List scheduled changes in time order
    List,
    /// Schedule a preset change at HH:MM local time
    Set {
        /// Preset ID to apply
        preset_id: String,

        /// Time of day (HH:MM)
        time: String,

        /// Replace the change with this ID instead of creating a new one
        #[arg(long)]
        id: Option<String>,
    },
    /// Remove a scheduled change
    Remove {
        /// Schedule ID
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum PresetsAction {
    /// List presets and the selected one
    List,
    /// Apply a preset by name ("None" disables all presets)
    Apply { name: String },
    /// Save the enabled themes as a new preset and activate it
    Create { name: String },
}

#[derive(Subcommand, Debug)]
enum ThemesAction {
    /// List installed themes
    List,
    /// Enable a theme and its dependencies
    Enable { name: String },
    /// Disable a theme
    Disable { name: String },
    /// Rescan the themes directory
    Reload,
    /// Install a catalog theme by id, with missing dependencies
    Install { id: String },
    /// Delete an installed theme
    Uninstall { name: String },
}

#[derive(Subcommand, Debug)]
enum CatalogAction {
    /// Store a short token and log in
    Login {
        /// Short token from the catalog account page
        token: String,
    },
    /// Forget the stored token
    Logout,
    /// List catalog themes
    Themes {
        /// Comma-separated target filters
        #[arg(long, default_value = "All")]
        filters: String,

        /// Sort order
        #[arg(long, default_value = "Most Downloaded")]
        order: String,

        /// Search text
        #[arg(long, default_value = "")]
        search: String,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 50)]
        per_page: u32,

        /// List your starred themes instead (requires login)
        #[arg(long)]
        starred: bool,
    },
    /// Star a theme
    Star {
        theme_id: String,

        /// Remove the star instead
        #[arg(long)]
        unstar: bool,
    },
}

// ============================================================================
// Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> std::process::ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            action,
            config,
            host,
            port,
        } => match action {
            Some(ServeAction::Stop) => commands::serve::stop(&config, port).await,
            None => commands::serve::run(&config, host, port).await,
        },
        Commands::Schedule { action, daemon } => {
            let (config, server) = (&daemon.config, daemon.server.as_deref());
            match action {
                ScheduleAction::List => commands::schedule::list(config, server).await,
                ScheduleAction::Set {
                    preset_id,
                    time,
                    id,
                } => {
                    commands::schedule::set(config, server, id.as_deref(), &preset_id, &time)
                        .await
                }
                ScheduleAction::Remove { id } => {
                    commands::schedule::remove(config, server, &id).await
                }
            }
        }
        Commands::Presets { action, daemon } => {
            let (config, server) = (&daemon.config, daemon.server.as_deref());
            match action {
                PresetsAction::List => commands::presets::list(config, server).await,
                PresetsAction::Apply { name } => {
                    commands::presets::apply(config, server, &name).await
                }
                PresetsAction::Create { name } => {
                    commands::presets::create(config, server, &name).await
                }
            }
        }
        Commands::Themes { action, daemon } => {
            let (config, server) = (&daemon.config, daemon.server.as_deref());
            match action {
                ThemesAction::List => commands::themes::list(config, server).await,
                ThemesAction::Enable { name } => {
                    commands::themes::set(config, server, &name, true).await
                }
                ThemesAction::Disable { name } => {
                    commands::themes::set(config, server, &name, false).await
                }
                ThemesAction::Reload => commands::themes::reload(config, server).await,
                ThemesAction::Install { id } => {
                    commands::themes::install(config, server, &id).await
                }
                ThemesAction::Uninstall { name } => {
                    commands::themes::uninstall(config, server, &name).await
                }
            }
        }
        Commands::Catalog { action, config } => match action {
            CatalogAction::Login { token } => commands::catalog::login(&config, &token).await,
            CatalogAction::Logout => commands::catalog::logout(&config).await,
            CatalogAction::Themes {
                filters,
                order,
                search,
                page,
                per_page,
                starred,
            } => {
                let query = ThemeQuery {
                    filters,
                    order,
                    search,
                    page,
                    per_page,
                };
                commands::catalog::themes(&config, query, starred).await
            }
            CatalogAction::Star { theme_id, unstar } => {
                commands::catalog::star(&config, &theme_id, unstar).await
            }
        },
    }
}

// ============================================================================
// Initialization
// ============================================================================

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
