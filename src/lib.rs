//! qa-intake - conversational QA coverage intake
//!
//! Collects monthly test-coverage figures for a project through a short
//! guided conversation and stores each update merged over the previous one
//! for the same project and month.
//!
//! # Architecture
//!
//! The crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and the port traits
//! - **Service Layer** (`services`): dialogue engine and submission merge
//! - **Adapters** (`adapters`): SQLite persistence and the HTTP extraction client
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use qa_intake::{DialogueEngine, SubmissionService};
//!
//! let (session, welcome) = engine.start_session(today);
//! let (reply, session) = engine.handle_message("Bridge", session, today).await;
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Config, ConversationSession, ConversationState, CoverageMetrics, ProjectId, ProjectRegistry,
    ReportingPeriod, Submission, SubmissionCommand, SubmissionMetrics,
};
pub use domain::ports::{ExtractionPort, SubmissionRepository};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{DialogueEngine, SessionRateLimiter, SubmissionService};
