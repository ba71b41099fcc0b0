pub mod dialogue_engine;
pub mod formatters;
pub mod intent;
pub mod rate_limiter;
pub mod submission_service;

pub use dialogue_engine::DialogueEngine;
pub use rate_limiter::SessionRateLimiter;
pub use submission_service::SubmissionService;
