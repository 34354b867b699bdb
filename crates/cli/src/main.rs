//! Stepwright CLI - Main Entry Point
//!
//! Command-line interface for browsing test suites, cases, and steps,
//! and for exporting generated Playwright scripts.

use clap::{Parser, Subcommand};
use colored::Colorize;

use stepwright_cli::client::ApiClient;
use stepwright_cli::commands::{case, generate, step, suite};
use stepwright_cli::output;

/// Stepwright CLI - Step-Sequence Test Builder
#[derive(Parser)]
#[command(name = "stepwright")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// API server address
    #[arg(
        long,
        env = "STEPWRIGHT_API",
        default_value = "http://127.0.0.1:8080",
        global = true
    )]
    api_addr: String,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage test suites
    #[command(subcommand)]
    Suite(suite::SuiteCommands),

    /// Manage test cases
    #[command(subcommand)]
    Case(case::CaseCommands),

    /// Inspect test steps
    #[command(subcommand)]
    Step(step::StepCommands),

    /// Generate the Playwright script for a test case
    Generate(generate::GenerateArgs),

    /// Check API server status
    Status,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let client = ApiClient::new(&cli.api_addr);

    match cli.command {
        Commands::Suite(cmd) => suite::execute(cmd, &client, cli.format).await?,
        Commands::Case(cmd) => case::execute(cmd, &client, cli.format).await?,
        Commands::Step(cmd) => step::execute(cmd, &client, cli.format).await?,
        Commands::Generate(args) => generate::execute(args, &client).await?,
        Commands::Status => {
            if client.health_check().await {
                println!("✅ API is {} at {}", "running".green(), cli.api_addr);
            } else {
                println!("❌ API is {} at {}", "not responding".red(), cli.api_addr);
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("Stepwright CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Step-sequence test builder for Playwright");
        }
    }

    Ok(())
}
