//! Domain layer for the QA intake system
//!
//! This module contains the conversation model, reporting value objects,
//! the submission merge rules and the port traits adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
