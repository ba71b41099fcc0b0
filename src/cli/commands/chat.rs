//! Interactive intake conversation over stdin/stdout.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Args;
use console::style;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use super::submission_service;
use crate::adapters::extraction::{ExtractionClientConfig, HttpExtractionClient};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, ConversationSession};
use crate::services::formatters;
use crate::services::{DialogueEngine, SessionRateLimiter};

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Override the extraction service base URL
    #[arg(long)]
    pub extraction_url: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct ChatTurnOutput {
    pub session_id: String,
    pub state: String,
    pub response: String,
}

impl ChatTurnOutput {
    fn new(session: &ConversationSession, response: String) -> Self {
        Self {
            session_id: session.id.to_string(),
            state: session.state.as_str().to_string(),
            response,
        }
    }
}

impl CommandOutput for ChatTurnOutput {
    fn to_human(&self) -> String {
        format!("{} {}", style("Assistant:").cyan().bold(), self.response)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Reply for messages over the configured length; `None` when acceptable.
pub fn check_input_length(message: &str, max_chars: usize) -> Option<String> {
    (message.trim().chars().count() > max_chars)
        .then(|| formatters::input_too_long_message(max_chars))
}

/// Replies that need neither a rate-limit slot nor the engine.
fn check_input(message: &str, max_chars: usize) -> Option<String> {
    if message.trim().is_empty() {
        return Some(formatters::EMPTY_MESSAGE_PROMPT.to_string());
    }
    check_input_length(message, max_chars)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn is_exit(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "exit" | "quit" | ":q")
}

pub async fn execute(args: ChatArgs, config: &Config, json_mode: bool) -> Result<()> {
    let mut client_config = ExtractionClientConfig::from(&config.extraction);
    if let Some(url) = args.extraction_url {
        client_config.base_url = url;
    }
    let extractor = HttpExtractionClient::new(client_config)?;
    let submissions = submission_service(config).await?;
    let engine = DialogueEngine::new(
        Arc::new(extractor),
        submissions,
        Arc::new(config.registry.clone()),
    )
    .with_grace_period_days(config.chat.grace_period_days);
    let limiter = SessionRateLimiter::from_config(&config.rate_limit)
        .context("Invalid rate limit configuration")?;

    let (mut session, welcome) = engine.start_session(today());
    info!(session_id = %session.id, "chat started");
    output(&ChatTurnOutput::new(&session, welcome), json_mode);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if !json_mode {
            print!("{} ", style("You:").green().bold());
            std::io::stdout().flush().context("Failed to flush stdout")?;
        }

        let Some(line) = lines.next_line().await.context("Failed to read from stdin")? else {
            break;
        };
        if is_exit(&line) {
            break;
        }

        let response = if let Some(rejection) = check_input(&line, config.chat.input_max_chars) {
            rejection
        } else if let Err(wait) = limiter.check(session.id).await {
            formatters::rate_limited_message(wait)
        } else {
            let previous_id = session.id;
            let (response, next) = engine.handle_message(&line, session, today()).await;
            session = next;
            if session.id != previous_id {
                limiter.prune().await;
            }
            response
        };

        output(&ChatTurnOutput::new(&session, response), json_mode);
    }

    info!(session_id = %session.id, state = %session.state, "chat ended");
    Ok(())
}
