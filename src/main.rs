use agentrail::cli::{self, Cli, Commands};
use agentrail::config;
use agentrail::errors::AgentrailError;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(!cli.no_color)
            .with_writer(std::io::stderr)
            .init();
    }

    let result = match &cli.command {
        Commands::Serve(args) => cli::serve::handle_serve(&cli, args.clone()).await,
        Commands::Agents => cli::query::handle_agents(&cli).await,
        Commands::Run(args) => cli::run::handle_run(&cli, args.clone()).await,
        Commands::Chain(args) => cli::run::handle_chain(&cli, args.clone()).await,
        Commands::Resume(args) => cli::run::handle_resume(&cli, args.clone()).await,
        Commands::Executions(args) => cli::query::handle_executions(&cli, args.clone()).await,
        Commands::Metrics(args) => cli::query::handle_metrics(&cli, args.clone()).await,
        Commands::Validate(args) => handle_validate(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(e.classify().exit_code);
    }
}

async fn handle_validate(args: &cli::commands::ValidateArgs) -> Result<(), AgentrailError> {
    let path = std::path::PathBuf::from(&args.config);
    let config = config::parse_config(&path).await?;
    println!(
        "Configuration is valid: {} ({} chains, database {})",
        args.config,
        config.chains.len(),
        config.database.path
    );
    Ok(())
}
