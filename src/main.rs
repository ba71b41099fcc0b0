//! qa-intake CLI entry point.

use clap::Parser;

use qa_intake::cli::commands::{self, chat, init, projects, submissions};
use qa_intake::cli::{handle_error, Cli, Commands};
use qa_intake::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Commands::Init(args) = cli.command {
        if let Err(err) = init::execute(args, json).await {
            handle_error(err, json);
        }
        return;
    }

    let config = match commands::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => handle_error(err, json),
    };

    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, json),
    };

    let result = match cli.command {
        Commands::Init(_) => Ok(()),
        Commands::Chat(args) => chat::execute(args, &config, json).await,
        Commands::Projects(args) => projects::execute(args, &config, json),
        Commands::Submissions(args) => submissions::execute(args, &config, json).await,
    };

    if let Err(err) = result {
        handle_error(err, json);
    }
}
