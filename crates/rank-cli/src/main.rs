//! novelrank CLI binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use rank_cli::cli::{Cli, Commands};
use rank_cli::commands::{
    ItemCommand, QueryCommand, RatingCommand, ReconcileCommand, SeedCommand, SimulateCommand,
    UserCommand,
};
use rank_cli::output::OutputFormat;
use rank_cli::{CliResult, Session};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let format = OutputFormat::new(cli.format);
    let session = Session::open(&cli.state, cli.config.as_deref())?;
    let mut stdout = io::stdout().lock();

    match &cli.command {
        Commands::User { command } => {
            UserCommand::new(&session)
                .execute(&mut stdout, &format, command)
                .await?;
        }
        Commands::Item { command } => {
            ItemCommand::new(&session)
                .execute(&mut stdout, &format, command)
                .await?;
        }
        Commands::Rate(args) => {
            RatingCommand::new(&session)
                .rate(&mut stdout, &format, args)
                .await?;
        }
        Commands::Vote(args) => {
            RatingCommand::new(&session)
                .vote(&mut stdout, &format, args)
                .await?;
        }
        Commands::Score { item } => {
            QueryCommand::new(&session)
                .score(&mut stdout, &format, item)
                .await?;
        }
        Commands::Trust { user } => {
            QueryCommand::new(&session)
                .trust(&mut stdout, &format, user)
                .await?;
        }
        Commands::Ranking { limit } => {
            QueryCommand::new(&session)
                .ranking(&mut stdout, &format, *limit)
                .await?;
        }
        Commands::Reconcile(args) => {
            ReconcileCommand::new(&session)
                .execute(&mut stdout, &format, args)
                .await?;
        }
        Commands::Seed => {
            SeedCommand::new(&session).execute(&mut stdout, &format).await?;
        }
        Commands::Simulate(args) => {
            SimulateCommand::new(&session)
                .execute(&mut stdout, &format, args)
                .await?;
        }
    }

    let stats = session.close().await?;
    debug!(
        spawned = stats.spawned,
        failed = stats.failed,
        panicked = stats.panicked,
        "Background work drained"
    );
    Ok(())
}
