//! Common test utilities for integration tests
//!
//! Provides a deterministic keyword extractor and an engine wired to an
//! in-memory SQLite database.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

use qa_intake::adapters::sqlite::{create_migrated_test_pool, SqliteSubmissionRepository};
use qa_intake::domain::models::{default_portfolio, Confidence, CoverageMetrics};
use qa_intake::domain::ports::{CoverageExtraction, ProjectMatch};
use qa_intake::{
    ConversationSession, DialogueEngine, DomainError, DomainResult, ExtractionPort,
    ProjectRegistry, ReportingPeriod, SubmissionService,
};

pub type TestEngine = DialogueEngine<KeywordExtractor, SqliteSubmissionRepository>;

/// Extractor that understands a small fixed vocabulary.
///
/// - project: exact id/name is high confidence, a mention inside a longer
///   sentence is medium
/// - period: "<month name> <year>"
/// - coverage: "<n> manual", "<n> automated", "<n> releases"
pub struct KeywordExtractor;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

#[async_trait]
impl ExtractionPort for KeywordExtractor {
    async fn extract_project(
        &self,
        text: &str,
        registry: &ProjectRegistry,
    ) -> DomainResult<ProjectMatch> {
        let lowered = text.trim().to_lowercase();
        if let Some(project) = registry.find_project(&lowered) {
            return Ok(ProjectMatch {
                project_id: project.project_id()?,
                confidence: Confidence::High,
            });
        }

        registry
            .projects
            .iter()
            .find(|p| lowered.contains(&p.name.to_lowercase()))
            .map(|p| {
                Ok(ProjectMatch {
                    project_id: p.project_id()?,
                    confidence: Confidence::Medium,
                })
            })
            .unwrap_or_else(|| Err(DomainError::AmbiguousExtraction("project identifier".to_string())))
    }

    async fn extract_period(&self, text: &str, _today: NaiveDate) -> DomainResult<ReportingPeriod> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().collect();
        for pair in tokens.windows(2) {
            if let Some(index) = MONTHS.iter().position(|m| *m == pair[0]) {
                if let Ok(year) = pair[1].parse::<i32>() {
                    return ReportingPeriod::new(year, index as u32 + 1);
                }
            }
        }
        Err(DomainError::AmbiguousExtraction("reporting month".to_string()))
    }

    async fn extract_coverage(&self, text: &str) -> DomainResult<CoverageExtraction> {
        let lowered = text.to_lowercase().replace(',', " ");
        let tokens: Vec<&str> = lowered.split_whitespace().collect();
        let mut extraction = CoverageExtraction::default();

        for pair in tokens.windows(2) {
            let Ok(value) = pair[0].parse::<u32>() else {
                continue;
            };
            match pair[1] {
                word if word.starts_with("manual") => extraction.coverage.manual_total = Some(value),
                word if word.starts_with("automated") => {
                    extraction.coverage.automated_total = Some(value);
                }
                word if word.starts_with("release") => {
                    extraction.supported_releases_count = Some(value);
                }
                _ => {}
            }
        }

        if extraction.coverage.is_empty() && extraction.supported_releases_count.is_none() {
            return Err(DomainError::AmbiguousExtraction("test coverage".to_string()));
        }
        Ok(extraction)
    }
}

/// Engine plus a handle on the same submission service for assertions.
pub async fn setup_engine() -> (TestEngine, SubmissionService<SqliteSubmissionRepository>) {
    let pool = create_migrated_test_pool()
        .await
        .expect("Failed to create test database");
    let service = SubmissionService::new(Arc::new(SqliteSubmissionRepository::new(pool)));
    let engine = DialogueEngine::new(
        Arc::new(KeywordExtractor),
        service.clone(),
        Arc::new(default_portfolio()),
    );
    (engine, service)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub fn period(year: i32, month: u32) -> ReportingPeriod {
    ReportingPeriod::new(year, month).expect("valid period")
}

/// Send each message in turn, returning the last reply and the session.
pub async fn converse(
    engine: &TestEngine,
    session: ConversationSession,
    today: NaiveDate,
    messages: &[&str],
) -> (String, ConversationSession) {
    let mut session = session;
    let mut reply = String::new();
    for message in messages {
        let (next_reply, next_session) = engine.handle_message(message, session, today).await;
        reply = next_reply;
        session = next_session;
    }
    (reply, session)
}

pub fn coverage(manual: Option<u32>, automated: Option<u32>) -> CoverageMetrics {
    CoverageMetrics {
        manual_total: manual,
        automated_total: automated,
        ..Default::default()
    }
}
