use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tabula")]
#[command(about = "Tabula - conversational CSV analysis with versioned datasets", long_about = None)]
struct Cli {
    /// Path to the configuration file (created with defaults if missing)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a CSV file as a new project
    Upload {
        /// Path to the CSV file
        file: PathBuf,
        /// Display name (defaults to the filename stem)
        #[arg(long)]
        name: Option<String>,
    },
    /// List all projects
    Projects,
    /// Delete a project and everything under it
    Delete {
        project_id: String,
    },
    /// List the chats of a project
    Chats {
        project_id: String,
    },
    /// Open a new chat on a project
    NewChat {
        project_id: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Ask a natural-language question in a chat
    Ask {
        project_id: String,
        chat_id: String,
        query: String,
    },
    /// Show the message history of a chat
    History {
        project_id: String,
        chat_id: String,
    },
    /// List the version history of a project
    Versions {
        project_id: String,
    },
    /// Revert a project to an earlier version (as a new version)
    Revert {
        project_id: String,
        version: u32,
    },
    /// Export a version snapshot to a file
    Export {
        project_id: String,
        version: u32,
        /// Destination path for the CSV
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let ctx = commands::build(&cli.config)?;

    match cli.command {
        Commands::Upload { file, name } => {
            commands::project::upload(&ctx, &file, name.as_deref()).await?
        }
        Commands::Projects => commands::project::list(&ctx).await?,
        Commands::Delete { project_id } => commands::project::delete(&ctx, &project_id).await?,
        Commands::Chats { project_id } => commands::chat::list(&ctx, &project_id).await?,
        Commands::NewChat { project_id, name } => {
            commands::chat::create(&ctx, &project_id, name.as_deref()).await?
        }
        Commands::Ask {
            project_id,
            chat_id,
            query,
        } => commands::query::ask(&ctx, &project_id, &chat_id, &query).await?,
        Commands::History {
            project_id,
            chat_id,
        } => commands::chat::history(&ctx, &project_id, &chat_id).await?,
        Commands::Versions { project_id } => {
            commands::version::list(&ctx, &project_id).await?
        }
        Commands::Revert {
            project_id,
            version,
        } => commands::version::revert(&ctx, &project_id, version).await?,
        Commands::Export {
            project_id,
            version,
            out,
        } => commands::version::export(&ctx, &project_id, version, &out).await?,
    }

    Ok(())
}
