use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

use commands::{ConfigCommand, Engine, GroupCommand, MemberCommand, WatchCommand};
use roastcheck::config::ClientConfig;
use roastcheck::sync::{HttpClient, SyncEngine};

#[derive(Parser)]
#[command(name = "roastcheck")]
#[command(version)]
#[command(about = "Track roast groups and member check-ins", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage groups
    Group(GroupCommand),

    /// Manage members and check-ins
    Member(MemberCommand),

    /// Show a live roster that refreshes in the background
    Watch(WatchCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "roastcheck=warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = ClientConfig::load(cli.config)?;

    match cli.command {
        Some(Commands::Group(cmd)) => {
            let engine = connect(&config).await?;
            cmd.run(&engine).await?;
        }
        Some(Commands::Member(cmd)) => {
            let engine = connect(&config).await?;
            cmd.run(&engine).await?;
        }
        Some(Commands::Watch(cmd)) => {
            let engine = Arc::new(connect(&config).await?);
            cmd.run(engine, config.revalidate_interval()).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

/// Build an engine against the configured server and load the roster.
async fn connect(config: &ClientConfig) -> Result<Engine, Box<dyn std::error::Error>> {
    let engine = SyncEngine::new(HttpClient::new(config.server_url.value.clone()));
    if let Err(e) = engine.refresh().await {
        return Err(format!("{} (server: {})", e, engine.api().server_url()).into());
    }
    Ok(engine)
}
