//! Squad Board - team presence dashboard
//!
//! Terminal client for the squad's absence webhooks: who is online, pending
//! requests, roster management and the monthly report.

mod api;
mod config;
mod models;
mod presence;
mod report;
mod store;
mod tui;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use tui::log_capture::ActivityLog;

#[derive(Parser)]
#[command(name = "squad-board")]
#[command(about = "Team presence dashboard backed by absence webhooks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show who is online right now
    Status {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show headline counts
    Summary {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List absence requests awaiting a decision
    Pending,

    /// List decided absence requests, newest first
    History,

    /// Approve a pending absence request
    Approve {
        /// Absence id (from `pending` output)
        id: String,
    },

    /// Reject a pending absence request
    Reject {
        /// Absence id (from `pending` output)
        id: String,
    },

    /// List roster members
    Users,

    /// Add a roster member
    AddUser {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,
    },

    /// Remove a roster member
    RemoveUser {
        /// Member id (from `users` output)
        id: String,
    },

    /// Find a roster member by id or email
    Find {
        /// Member id or email
        query: String,
    },

    /// Write the monthly CSV report
    Export {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Show the active configuration
    Config {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,
    },

    /// Launch the terminal user interface
    Tui {
        /// Directory for reports exported from the dashboard
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging. The TUI owns the terminal, so its logs go to the
    // Activity tab instead of stderr.
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());
    let activity = ActivityLog::new();
    if matches!(cli.command, Commands::Tui { .. }) {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(activity.clone()),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }

    if let Commands::Config { init: true } = cli.command {
        let path = Config::default().save(cli.config.as_deref())?;
        println!("Default configuration written to {}", path.display());
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Status { json } => {
            api::show_status(&config, json).await?;
        }
        Commands::Summary { json } => {
            api::show_summary(&config, json).await?;
        }
        Commands::Pending => {
            api::list_pending(&config).await?;
        }
        Commands::History => {
            api::list_history(&config).await?;
        }
        Commands::Approve { id } => {
            tracing::info!("Approving {}...", id);
            api::approve(&config, &id).await?;
        }
        Commands::Reject { id } => {
            tracing::info!("Rejecting {}...", id);
            api::reject(&config, &id).await?;
        }
        Commands::Users => {
            api::list_users(&config).await?;
        }
        Commands::AddUser { name, email } => {
            tracing::info!("Adding {}...", email);
            api::add_user(&config, &name, &email).await?;
        }
        Commands::RemoveUser { id } => {
            tracing::info!("Removing {}...", id);
            api::remove_user(&config, &id).await?;
        }
        Commands::Find { query } => {
            api::find_user(&config, &query).await?;
        }
        Commands::Export { out } => {
            api::export(&config, &out).await?;
        }
        Commands::Config { .. } => {
            let path = Config::resolve_path(cli.config.as_deref())?;
            println!("# {}", path.display());
            print!("{}", toml::to_string_pretty(&config)?);
        }
        Commands::Tui { out } => {
            tui::run(config, activity, out).await?;
        }
    }

    Ok(())
}
