pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use offerly_core::config::{AppConfig, LoadOptions, LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

use crate::commands::resolve::ResolveArgs;

#[derive(Debug, Parser)]
#[command(
    name = "offerly",
    about = "Offerly discount resolution CLI",
    long_about = "Resolve and apply storefront discounts, and manage the discount store.",
    after_help = "Examples:\n  offerly migrate\n  offerly resolve --partner acme --scope real_estate\n  offerly price --partner acme --scope delivery --amount 18000"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo discount dataset")]
    Seed,
    #[command(about = "Import a storefront key-value export of discount documents")]
    Import {
        #[arg(long, help = "Path to the exported JSON document")]
        file: PathBuf,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Resolve the single discount that applies to a request")]
    Resolve(ResolveArgs),
    #[command(about = "Resolve a discount and apply it to an amount")]
    Price {
        #[arg(long, help = "Amount to price, in the configured currency")]
        amount: String,
        #[command(flatten)]
        context: ResolveArgs,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => init_logging(&config.logging),
        Err(_) => init_logging(&AppConfig::default().logging),
    }

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Import { file } => commands::import::run(&file),
        Command::Config => commands::config::run(),
        Command::Resolve(args) => commands::resolve::run(&args),
        Command::Price { amount, context } => commands::price::run(&amount, &context),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout carries only the command payload.
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.trim().to_ascii_lowercase()));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let _ = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
