use anyhow::Result;
use clap::Parser;
use rule_debugger::cli::{commands, Cli, Commands};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments
    let cli = Cli::parse();
    let verbosity = cli.verbosity();

    // Logs go to stderr so stdout stays machine readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| verbosity.to_log_level().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let success = match cli.command {
        Commands::Completions(args) => commands::completions(args)?,
        Commands::Step(args) => {
            let config = cli.global.load_config()?;
            commands::step(args, &config, verbosity).await?
        }
        Commands::Trace(args) => {
            let config = cli.global.load_config()?;
            commands::trace(args, &config, verbosity).await?
        }
        Commands::Instrument(args) => {
            let config = cli.global.load_config()?;
            commands::instrument(args, &config)?
        }
        Commands::Request(args) => {
            let config = cli.global.load_config()?;
            commands::request(args, &config).await?
        }
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
