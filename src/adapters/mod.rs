//! Adapters for storage and the extraction service.

pub mod extraction;
pub mod sqlite;
