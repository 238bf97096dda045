//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod deploy;
mod documents;
mod helpers;
mod init;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};
use crate::deploy::DeployOptions;

#[derive(Parser)]
#[command(name = "docextract")]
#[command(about = "Document OCR, field extraction and review")]
#[command(version)]
pub struct Cli {
    /// Target directory or database file (overrides config file).
    /// Can be a directory containing docextract.db or a .db file directly.
    #[arg(long, short = 't', global = true)]
    target: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Register a stored document without processing it
    Register {
        /// Document location (s3://bucket/key, file:// URL or path)
        url: String,
        /// Document ID (defaults to the file name without extension)
        #[arg(long)]
        id: Option<String>,
    },

    /// Print the raw OCR text of a document
    Text {
        /// Document location
        url: String,
    },

    /// Run OCR and field extraction, then record the result
    Extract {
        /// Document location
        url: String,
        /// Form to extract (skips classification)
        #[arg(long = "type", short = 'T')]
        document_type: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a stored document
    Show {
        /// Document ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List stored documents, most recently updated first
    List {
        /// Filter by status (pending, complete, verified)
        #[arg(short, long)]
        status: Option<String>,
        /// Maximum number of documents to show
        #[arg(short, long, default_value = "50")]
        limit: i64,
    },

    /// Start the review API server
    Serve {
        /// Address to bind to (host:port, host, or port)
        #[arg(default_value = "127.0.0.1:3030")]
        bind: String,
    },

    /// Build the backend and frontend, then apply the Terraform stack
    Deploy {
        /// Skip the backend build
        #[arg(long)]
        skip_backend: bool,
        /// Skip the frontend build
        #[arg(long)]
        skip_frontend: bool,
        /// Only run terraform plan
        #[arg(long)]
        plan_only: bool,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        target: cli.target,
    };
    let (settings, _config) = load_settings_with_options(options)
        .await
        .map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Register { url, id } => {
            documents::cmd_register(&settings, &url, id.as_deref()).await
        }
        Commands::Text { url } => documents::cmd_text(&settings, &url).await,
        Commands::Extract {
            url,
            document_type,
            json,
        } => documents::cmd_extract(&settings, &url, document_type.as_deref(), json).await,
        Commands::Show { id, json } => documents::cmd_show(&settings, &id, json).await,
        Commands::List { status, limit } => {
            documents::cmd_list(&settings, status.as_deref(), limit).await
        }
        Commands::Serve { bind } => serve::cmd_serve(&settings, &bind).await,
        Commands::Deploy {
            skip_backend,
            skip_frontend,
            plan_only,
        } => {
            let options = DeployOptions {
                skip_backend,
                skip_frontend,
                plan_only,
            };
            deploy::cmd_deploy(&settings, options).await
        }
    }
}
