use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::conversation::ConversationSession;
use super::metrics::{CoverageMetrics, SubmissionMetrics};
use super::period::ReportingPeriod;
use super::project::ProjectId;
use crate::domain::errors::{DomainError, DomainResult};

/// A persisted coverage report for one project and month.
///
/// Submissions are immutable. A later update for the same project and month
/// is stored as a new submission carrying the merged payload. Timestamps are
/// kept at microsecond precision, matching what storage round-trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub project: ProjectId,
    pub period: ReportingPeriod,
    pub metrics: SubmissionMetrics,
    pub created_at: DateTime<Utc>,
    pub raw_conversation: Option<String>,
}

impl Submission {
    pub fn create(
        project: ProjectId,
        period: ReportingPeriod,
        metrics: SubmissionMetrics,
        raw_conversation: Option<String>,
    ) -> DomainResult<Self> {
        metrics.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            project,
            period,
            metrics,
            created_at: Utc::now().trunc_subsecs(6),
            raw_conversation: raw_conversation.filter(|raw| !raw.trim().is_empty()),
        })
    }
}

/// Request to store the data collected by a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionCommand {
    pub project: ProjectId,
    pub period: ReportingPeriod,
    pub coverage: Option<CoverageMetrics>,
    pub overall_test_cases: Option<u32>,
    pub supported_releases_count: Option<u32>,
    pub raw_conversation: Option<String>,
}

impl SubmissionCommand {
    /// Build a command from a session that has reached confirmation.
    pub fn from_session(session: &ConversationSession) -> DomainResult<Self> {
        let (Some(project), Some(period)) = (&session.project, session.period) else {
            return Err(DomainError::MissingSubmissionData(
                "Project and reporting month are required.".to_string(),
            ));
        };

        Ok(Self {
            project: project.clone(),
            period,
            coverage: session.coverage_metrics,
            overall_test_cases: None,
            supported_releases_count: session.supported_releases_count,
            raw_conversation: Some(session.transcript()),
        })
    }

    pub fn metrics(&self) -> DomainResult<SubmissionMetrics> {
        SubmissionMetrics::new(
            self.coverage,
            self.overall_test_cases,
            self.supported_releases_count,
        )
    }
}
