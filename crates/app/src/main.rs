mod admin;
mod cli;
mod host;
mod middleware;
mod problem;
mod resolver;
mod router;
mod seed;
mod telemetry;

use std::{net::SocketAddr, process::ExitCode};

use clap::Parser;
use tracing::{debug, info};
use tenant_polls_storage::Database;
use tenant_polls_util::{load_env_file, AppConfig};

use crate::cli::{Cli, Command, CreateDomainCli};
use crate::seed::{
    CreateDomainArgs, CreateDomainCommand, SeedError, SeedOutcome, StdConsole, CANCELLED_MESSAGE,
};

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    load_env_file();
    let config = AppConfig::from_env()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::CreateDomain(args) => create_domain(config, args).await,
    }
}

async fn serve(config: AppConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    telemetry::init_tracing(&config, "info")?;
    let metrics = telemetry::init_metrics()?;

    let database = Database::connect(&config.database_url).await?;
    database.run_migrations().await?;

    let state = router::AppState::new(metrics, database, config.use_forwarded_host);

    let addr: SocketAddr = config.bind_addr;
    info!(stage = "app", %addr, env = %config.environment.as_str(), forwarded_host = config.use_forwarded_host, "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router::app_router(state)).await?;
    Ok(ExitCode::SUCCESS)
}

async fn create_domain(
    config: AppConfig,
    args: CreateDomainCli,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    telemetry::init_tracing(&config, "warn")?;

    // Watched from before the database opens so an early interrupt still reports.
    tokio::select! {
        outcome = seed_domain(config, args) => match outcome? {
            Ok(_) => Ok(ExitCode::SUCCESS),
            Err(SeedError::Cancelled) => {
                eprintln!("{CANCELLED_MESSAGE}");
                Ok(ExitCode::FAILURE)
            }
            Err(err) => {
                debug!(stage = "seed", error = %err, "createdomain failed");
                eprintln!("CommandError: {err}");
                Ok(ExitCode::FAILURE)
            }
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("{CANCELLED_MESSAGE}");
            // The prompt task may still be blocked on stdin.
            std::process::exit(1);
        }
    }
}

async fn seed_domain(
    config: AppConfig,
    args: CreateDomainCli,
) -> Result<Result<SeedOutcome, SeedError>, Box<dyn std::error::Error>> {
    let database_url = args.database.unwrap_or(config.database_url);
    let database = Database::connect(&database_url).await?;
    database.run_migrations().await?;

    let command = CreateDomainCommand::new(database.domains());
    let seed_args = CreateDomainArgs {
        domain: args.domain,
        name: args.name,
        verbosity: args.verbosity,
    };
    let outcome = tokio::spawn(async move {
        let mut console = StdConsole;
        command.run(seed_args, &mut console).await
    })
    .await?;
    Ok(outcome)
}
