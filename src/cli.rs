use clap::{Parser, Subcommand};
use inquire::{InquireError, Text};
use tracing::error;

use crate::config::{self, SessionConfig};
use crate::error::{ConfigError, OrchestratorError};
use crate::service::orchestrator::Orchestrator;

#[derive(Parser, Debug)]
#[command(name = "calendar-bot", about = "Talk to your calendar in plain language")]
pub struct Cli {
    /// Chat model identifier
    #[arg(long)]
    pub model: Option<String>,
    /// Reply length cap in tokens, 0 for none
    #[arg(long)]
    pub max_tokens: Option<u32>,
    /// Force JSON-object replies from the model
    #[arg(long)]
    pub json_output: bool,
    /// Target calendar
    #[arg(long)]
    pub calendar_id: Option<String>,
    /// IANA timezone used for prompts and planning windows
    #[arg(long)]
    pub timezone: Option<String>,
    /// Log prompts and raw model replies
    #[arg(short, long)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Interactive conversation (default)
    Chat,
    /// Run a single request and print the reply
    Once { text: Vec<String> },
}

impl Cli {
    /// Applies flag overrides on top of file and environment settings.
    pub fn apply(&self, session: &mut SessionConfig) -> Result<(), ConfigError> {
        if let Some(model) = &self.model {
            session.model = model.clone();
        }
        if let Some(max_tokens) = self.max_tokens {
            session.max_tokens = (max_tokens > 0).then_some(max_tokens);
        }
        if self.json_output {
            session.json_output = true;
        }
        if let Some(calendar_id) = &self.calendar_id {
            session.calendar_id = calendar_id.clone();
        }
        if let Some(timezone) = &self.timezone {
            session.timezone = config::parse_timezone(timezone)?;
        }
        Ok(())
    }
}

pub fn is_exit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("exit")
}

pub async fn run_once(orchestrator: &mut Orchestrator, text: &str) -> Result<String, OrchestratorError> {
    orchestrator.prompt(text.trim()).await
}

/// Reads one line per turn until `exit` or end of input.
pub async fn run_console(orchestrator: &mut Orchestrator) {
    loop {
        let line = match Text::new("You:").prompt() {
            Ok(line) => line,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => {
                error!("failed to read input: {}", e);
                break;
            }
        };
        if is_exit(&line) {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        match orchestrator.prompt(line.trim()).await {
            Ok(reply) => println!("{}", reply),
            Err(e) => println!("Sorry, that didn't work: {}", e),
        }
    }
}
