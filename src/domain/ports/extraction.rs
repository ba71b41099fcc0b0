//! Extraction service port.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Confidence, CoverageMetrics, ProjectId, ProjectRegistry, ReportingPeriod};

/// Candidate project produced from free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMatch {
    pub project_id: ProjectId,
    pub confidence: Confidence,
}

/// Coverage numbers produced from free text.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CoverageExtraction {
    pub coverage: CoverageMetrics,
    pub supported_releases_count: Option<u32>,
}

/// Turns free-text answers into structured values.
///
/// Every failure is recoverable: the dialogue engine re-prompts and the
/// conversation continues.
#[async_trait]
pub trait ExtractionPort: Send + Sync {
    /// Match a project against the known registry.
    async fn extract_project(
        &self,
        text: &str,
        registry: &ProjectRegistry,
    ) -> DomainResult<ProjectMatch>;

    /// Resolve a reporting month relative to `today`.
    async fn extract_period(&self, text: &str, today: NaiveDate) -> DomainResult<ReportingPeriod>;

    /// Pull coverage metrics and the supported releases count.
    async fn extract_coverage(&self, text: &str) -> DomainResult<CoverageExtraction>;
}
