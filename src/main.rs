#![allow(non_snake_case)]

use std::env;
use std::process::ExitCode;

use calendarBot::cli::{self, Cli, Commands};
use calendarBot::config::{AppConfig, Settings};
use calendarBot::service::orchestrator::Orchestrator;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let file_config = match env::var("CONFIG_FILE") {
        Ok(path) => match AppConfig::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        Err(_) => AppConfig::default(),
    };

    let mut settings = match Settings::from_lookup(|key| file_config.get(key).or_else(|| env::var(key).ok())) {
        Ok(settings) => settings,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = cli.apply(&mut settings.session) {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    let mut orchestrator = Orchestrator::from_settings(settings);
    match cli.command {
        Some(Commands::Once { text }) => match cli::run_once(&mut orchestrator, &text.join(" ")).await {
            Ok(reply) => {
                println!("{}", reply);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::FAILURE
            }
        },
        Some(Commands::Chat) | None => {
            cli::run_console(&mut orchestrator).await;
            ExitCode::SUCCESS
        }
    }
}
