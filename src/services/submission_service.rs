//! Submission service: merge a partial update with history, then persist.

use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::domain::errors::DomainResult;
use crate::domain::models::{ProjectId, ReportingPeriod, Submission, SubmissionCommand};
use crate::domain::ports::SubmissionRepository;

/// Merge-on-submit persistence over a [`SubmissionRepository`].
///
/// Each submit writes a new row; earlier rows stay as history.
pub struct SubmissionService<R: SubmissionRepository> {
    repository: Arc<R>,
}

impl<R: SubmissionRepository> Clone for SubmissionService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: SubmissionRepository> SubmissionService<R> {
    /// Create a new submission service
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Store the command's metrics merged over the latest stored submission
    /// for the same project and month.
    #[instrument(skip(self, command), fields(project_id = %command.project, period = %command.period))]
    pub async fn submit(&self, command: SubmissionCommand) -> DomainResult<Submission> {
        let incoming = command.metrics()?;
        let existing = self
            .repository
            .latest_for(&command.project, command.period)
            .await?;

        if let Some(previous) = &existing {
            debug!(previous_id = %previous.id, "merging with latest submission");
        }

        let merged = incoming.merge_with(existing.as_ref().map(|s| &s.metrics))?;
        let submission = Submission::create(
            command.project,
            command.period,
            merged,
            command.raw_conversation,
        )?;
        self.repository.save(&submission).await?;

        info!(submission_id = %submission.id, merged = existing.is_some(), "submission saved");
        Ok(submission)
    }

    /// Most recent submission for a project and month, if any
    pub async fn latest(
        &self,
        project: &ProjectId,
        period: ReportingPeriod,
    ) -> DomainResult<Option<Submission>> {
        self.repository.latest_for(project, period).await
    }

    /// Every submission for a project and month, newest first
    pub async fn history(
        &self,
        project: &ProjectId,
        period: ReportingPeriod,
    ) -> DomainResult<Vec<Submission>> {
        self.repository.list_for(project, period).await
    }

    /// Submissions across all projects for one month
    pub async fn list_by_period(&self, period: ReportingPeriod) -> DomainResult<Vec<Submission>> {
        self.repository.list_by_period(period).await
    }

    /// Projects with at least one stored submission
    pub async fn reported_projects(&self) -> DomainResult<Vec<ProjectId>> {
        self.repository.all_projects().await
    }

    /// Distinct months with submissions, newest first, at most `limit`
    pub async fn recent_periods(&self, limit: u32) -> DomainResult<Vec<ReportingPeriod>> {
        self.repository.recent_periods(limit).await
    }
}
