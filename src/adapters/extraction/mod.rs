//! HTTP adapter for the extraction service.

pub mod errors;
pub mod http_client;
pub mod types;

pub use errors::ExtractionClientError;
pub use http_client::{ExtractionClientConfig, HttpExtractionClient};
