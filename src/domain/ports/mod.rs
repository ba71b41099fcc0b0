//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces that adapters implement:
//! - ExtractionPort: free text to structured project, period and coverage values
//! - SubmissionRepository: submission storage and queries

pub mod extraction;
pub mod submission_repository;

pub use extraction::{CoverageExtraction, ExtractionPort, ProjectMatch};
pub use submission_repository::SubmissionRepository;
