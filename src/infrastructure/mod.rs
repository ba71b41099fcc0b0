//! Infrastructure layer module
//!
//! Configuration loading and logging setup. Storage and the extraction
//! client live under `adapters`.

pub mod config;
pub mod logging;
