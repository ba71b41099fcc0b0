//! CLI type definitions
//!
//! Clap structures defining the command-line interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::chat::ChatArgs;
use super::commands::init::InitArgs;
use super::commands::projects::ProjectsArgs;
use super::commands::submissions::SubmissionsArgs;

#[derive(Parser)]
#[command(name = "qa-intake")]
#[command(about = "Conversational intake of monthly QA test coverage", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Load configuration from this file instead of .qa-intake/
    #[arg(short, long, global = true, env = "QA_INTAKE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the default configuration and create the database
    Init(InitArgs),

    /// Start an interactive coverage intake conversation
    Chat(ChatArgs),

    /// Show the known business streams and projects
    Projects(ProjectsArgs),

    /// Query stored submissions
    Submissions(SubmissionsArgs),
}
