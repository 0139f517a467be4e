//! AgroPanel API server

use agropanel::{web, AppConfig, AppContext};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind
        #[arg(long)]
        host: Option<String>,
    },

    /// Generate example configuration
    Init {
        /// Output path for configuration
        #[arg(short, long, default_value = "agropanel.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("agropanel=debug,tower_http=info")
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve {
        port: None,
        host: None,
    }) {
        Commands::Serve { port, host } => {
            run_server(port, host).await?;
        }

        Commands::Init { output } => {
            generate_config(output).await?;
        }
    }

    Ok(())
}

async fn run_server(port: Option<u16>, host: Option<String>) -> anyhow::Result<()> {
    // Load configuration
    let mut config = AppConfig::from_env().unwrap_or_else(|e| {
        error!("Failed to load config: {}", e);
        info!("Using default configuration");
        AppConfig::default()
    });

    if let Some(port) = port {
        config.port = port;
    }
    if let Some(host) = host {
        config.host = host;
    }

    info!("Configuration loaded for: {}", config.app_name);

    // Initialize application context
    let context = AppContext::new(config.clone()).await?;
    info!("Database initialized");

    let app = web::create_router(context);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server running at http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn generate_config(output: PathBuf) -> anyhow::Result<()> {
    if output.exists() {
        error!("Configuration file already exists: {:?}", output);
        anyhow::bail!("file already exists");
    }

    let example_config = include_str!("../agropanel.example.toml");

    tokio::fs::write(&output, example_config).await?;

    info!("Generated configuration file: {:?}", output);
    info!("Edit this file, then run: agropanel serve");

    Ok(())
}
