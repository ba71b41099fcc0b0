//! SQLite implementation of the SubmissionRepository.

use async_trait::async_trait;
use chrono::SecondsFormat;
use sqlx::SqlitePool;

use super::{parse_datetime, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    CoverageMetrics, ProjectId, ReportingPeriod, Submission, SubmissionMetrics,
};
use crate::domain::ports::SubmissionRepository;

const SELECT_COLUMNS: &str = "SELECT id, project_id, month, coverage, overall_test_cases, supported_releases_count, raw_conversation, created_at FROM submissions";

#[derive(Clone)]
pub struct SqliteSubmissionRepository {
    pool: SqlitePool,
}

impl SqliteSubmissionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionRepository for SqliteSubmissionRepository {
    async fn save(&self, submission: &Submission) -> DomainResult<()> {
        let coverage_json = submission
            .metrics
            .coverage
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"INSERT INTO submissions (id, project_id, month, coverage, overall_test_cases, supported_releases_count, raw_conversation, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#
        )
        .bind(submission.id.to_string())
        .bind(submission.project.as_str())
        .bind(submission.period.to_iso_month())
        .bind(coverage_json)
        .bind(submission.metrics.overall_test_cases.map(i64::from))
        .bind(submission.metrics.supported_releases_count.map(i64::from))
        .bind(submission.raw_conversation.as_deref())
        .bind(submission.created_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::StorageFailed(e.to_string()))?;

        Ok(())
    }

    async fn latest_for(
        &self,
        project: &ProjectId,
        period: ReportingPeriod,
    ) -> DomainResult<Option<Submission>> {
        let query = format!(
            "{SELECT_COLUMNS} WHERE project_id = ? AND month = ? ORDER BY created_at DESC, rowid DESC LIMIT 1"
        );
        let row: Option<SubmissionRow> = sqlx::query_as(&query)
            .bind(project.as_str())
            .bind(period.to_iso_month())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn list_for(
        &self,
        project: &ProjectId,
        period: ReportingPeriod,
    ) -> DomainResult<Vec<Submission>> {
        let query = format!(
            "{SELECT_COLUMNS} WHERE project_id = ? AND month = ? ORDER BY created_at DESC, rowid DESC"
        );
        let rows: Vec<SubmissionRow> = sqlx::query_as(&query)
            .bind(project.as_str())
            .bind(period.to_iso_month())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn list_by_period(&self, period: ReportingPeriod) -> DomainResult<Vec<Submission>> {
        let query =
            format!("{SELECT_COLUMNS} WHERE month = ? ORDER BY created_at DESC, rowid DESC");
        let rows: Vec<SubmissionRow> = sqlx::query_as(&query)
            .bind(period.to_iso_month())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn all_projects(&self) -> DomainResult<Vec<ProjectId>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT project_id FROM submissions ORDER BY project_id")
                .fetch_all(&self.pool)
                .await?;

        rows.iter()
            .map(|(id,)| ProjectId::parse(id))
            .collect()
    }

    async fn recent_periods(&self, limit: u32) -> DomainResult<Vec<ReportingPeriod>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT month FROM submissions ORDER BY month DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|(month,)| ReportingPeriod::parse_iso(month))
            .collect()
    }
}

#[derive(sqlx::FromRow)]
struct SubmissionRow {
    id: String,
    project_id: String,
    month: String,
    coverage: Option<String>,
    overall_test_cases: Option<i64>,
    supported_releases_count: Option<i64>,
    raw_conversation: Option<String>,
    created_at: String,
}

fn parse_count(value: Option<i64>, column: &str) -> DomainResult<Option<u32>> {
    value
        .map(u32::try_from)
        .transpose()
        .map_err(|_| DomainError::SerializationError(format!("Invalid {column} value")))
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = DomainError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let coverage: Option<CoverageMetrics> = row
            .coverage
            .map(|s| serde_json::from_str(&s))
            .transpose()?;

        let metrics = SubmissionMetrics {
            coverage: coverage.filter(|c| !c.is_empty()),
            overall_test_cases: parse_count(row.overall_test_cases, "overall_test_cases")?,
            supported_releases_count: parse_count(
                row.supported_releases_count,
                "supported_releases_count",
            )?,
        };

        Ok(Submission {
            id: parse_uuid(&row.id)?,
            project: ProjectId::parse(&row.project_id)?,
            period: ReportingPeriod::parse_iso(&row.month)?,
            metrics,
            created_at: parse_datetime(&row.created_at)?,
            raw_conversation: row.raw_conversation,
        })
    }
}
