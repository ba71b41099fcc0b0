//! Submission repository port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ProjectId, ReportingPeriod, Submission};

/// Repository interface for Submission persistence.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Store a new submission.
    async fn save(&self, submission: &Submission) -> DomainResult<()>;

    /// Most recent submission for a project and month.
    async fn latest_for(
        &self,
        project: &ProjectId,
        period: ReportingPeriod,
    ) -> DomainResult<Option<Submission>>;

    /// Every submission for a project and month, newest first.
    async fn list_for(
        &self,
        project: &ProjectId,
        period: ReportingPeriod,
    ) -> DomainResult<Vec<Submission>>;

    /// Every submission for a month, newest first.
    async fn list_by_period(&self, period: ReportingPeriod) -> DomainResult<Vec<Submission>>;

    /// Distinct projects with at least one submission.
    async fn all_projects(&self) -> DomainResult<Vec<ProjectId>>;

    /// Distinct months with submissions, newest first.
    async fn recent_periods(&self, limit: u32) -> DomainResult<Vec<ReportingPeriod>>;
}
