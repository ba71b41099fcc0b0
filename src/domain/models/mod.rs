pub mod confidence;
pub mod config;
pub mod conversation;
pub mod metrics;
pub mod period;
pub mod project;
pub mod registry;
pub mod submission;

pub use confidence::Confidence;
pub use config::{
    ChatConfig, Config, DatabaseConfig, ExtractionConfig, LoggingConfig, RateLimitConfig,
};
pub use conversation::{ConversationSession, ConversationState, HistoryEntry, Role};
pub use metrics::{CoverageMetrics, SubmissionMetrics};
pub use period::{ReportingPeriod, DEFAULT_GRACE_PERIOD_DAYS};
pub use project::{BusinessStream, Project, ProjectId};
pub use registry::{default_portfolio, ProjectRegistry};
pub use submission::{Submission, SubmissionCommand};
