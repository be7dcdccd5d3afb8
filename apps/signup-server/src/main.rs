use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use registration::config::RegistrationConfig;
use registration::Registration;
use runtime::{AppConfig, CliArgs};
use std::path::{Path, PathBuf};

mod db;
mod request_id;
mod server;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Signup Server - user registration over HTTP
#[derive(Parser)]
#[command(name = "signup-server")]
#[command(about = "Signup Server - user registration over HTTP")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Signup Server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config, args),
    }
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Initializing modules...");

    let registration_cfg: RegistrationConfig = config.module_config("registration")?;

    let conn = db::connect(&config, args.mock).await?;

    let module = Registration::new(conn.clone(), registration_cfg)?;
    module.migrate().await?;

    let router = server::build_router(&module, &config.server);
    let listener = server::bind(&config.server).await?;
    tracing::info!("Server listening on port {}", listener.local_addr()?.port());

    let served = server::serve(listener, router, server::shutdown_signal()).await;

    // The module's handle shares the pool; drop it before closing.
    drop(module);
    tracing::info!("Closing database connection");
    conn.close().await.context("Failed to close database connection")?;
    tracing::info!("Database connection closed");

    served
}

fn check_config(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Checking configuration...");

    // Validate only; nothing is created on disk.
    db::resolve_dsn(&config, args.mock, false)?;
    let _: RegistrationConfig = config.module_config("registration")?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);

    Ok(())
}
