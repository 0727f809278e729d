use clap::{Parser, Subcommand};

mod commands;

use commands::{ApiSuiteArgs, CompareFeesArgs, RunAllArgs};

#[derive(Parser)]
#[command(name = "bito-qa")]
#[command(about = "QA harness for the BitoPro public API and fees page", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare fees page tables against the limitations-and-fees API and write an HTML report
    CompareFees(CompareFeesArgs),
    /// Run the OHLC endpoint test suite
    ApiSuite(ApiSuiteArgs),
    /// Fee comparison followed by the API suite, notified together
    RunAll(RunAllArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::CompareFees(args) => commands::run_compare_fees(args).await?,
        Commands::ApiSuite(args) => commands::run_api_suite(args).await?,
        Commands::RunAll(args) => commands::run_all(args).await?,
    }

    Ok(())
}
