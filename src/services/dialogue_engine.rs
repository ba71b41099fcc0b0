//! Dialogue engine driving the coverage intake conversation.
//!
//! One call to [`DialogueEngine::handle_message`] is one turn: the session is
//! taken by value, advanced through its state machine, and handed back with
//! the response text. No error ends a conversation; failures become a
//! formatted message and a re-prompt.

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use super::formatters;
use super::intent::{self, PeriodAlias};
use super::submission_service::SubmissionService;
use crate::domain::errors::DomainResult;
use crate::domain::models::{
    ConversationSession, ConversationState, ProjectId, ProjectRegistry, ReportingPeriod, Role,
    SubmissionCommand, DEFAULT_GRACE_PERIOD_DAYS,
};
use crate::domain::ports::{ExtractionPort, SubmissionRepository};

/// Conversation state machine over an extractor and a submission store.
pub struct DialogueEngine<E: ExtractionPort, R: SubmissionRepository> {
    extractor: Arc<E>,
    submissions: SubmissionService<R>,
    registry: Arc<ProjectRegistry>,
    grace_period_days: u32,
}

impl<E: ExtractionPort, R: SubmissionRepository> DialogueEngine<E, R> {
    pub fn new(
        extractor: Arc<E>,
        submissions: SubmissionService<R>,
        registry: Arc<ProjectRegistry>,
    ) -> Self {
        Self {
            extractor,
            submissions,
            registry,
            grace_period_days: DEFAULT_GRACE_PERIOD_DAYS,
        }
    }

    /// Days into a month during which the previous month stays the default
    #[must_use]
    pub fn with_grace_period_days(mut self, days: u32) -> Self {
        self.grace_period_days = days;
        self
    }

    pub fn registry(&self) -> &ProjectRegistry {
        &self.registry
    }

    /// Create a fresh session whose history holds the welcome text.
    pub fn start_session(&self, today: NaiveDate) -> (ConversationSession, String) {
        let mut session = ConversationSession::new();
        let welcome = formatters::welcome_message(self.default_period(today));
        session.append_history(Role::Assistant, welcome.clone());
        debug!(session_id = %session.id, "session started");
        (session, welcome)
    }

    /// Process one user message.
    #[instrument(skip(self, message, session), fields(session_id = %session.id, state = %session.state))]
    pub async fn handle_message(
        &self,
        message: &str,
        mut session: ConversationSession,
        today: NaiveDate,
    ) -> (String, ConversationSession) {
        let started = Instant::now();
        let normalized = message.trim();
        if normalized.is_empty() {
            return (formatters::EMPTY_MESSAGE_PROMPT.to_string(), session);
        }

        let from_state = session.state;
        if from_state == ConversationState::Saved && intent::is_restart_request(normalized) {
            let (fresh, welcome) = self.start_session(today);
            info!(new_session_id = %fresh.id, "conversation restarted");
            return (welcome, fresh);
        }

        if from_state == ConversationState::Unknown {
            warn!("message received in unknown conversation state");
            return (formatters::unknown_state_message(), session);
        }

        session.append_history(Role::User, normalized);

        let response = match session.state {
            ConversationState::ProjectId => {
                self.handle_project_id(normalized, &mut session, today).await
            }
            ConversationState::ProjectConfirmation => {
                self.handle_project_confirmation(normalized, &mut session, today)
            }
            ConversationState::TimeWindow => {
                self.handle_time_window(normalized, &mut session, today).await
            }
            ConversationState::TestCoverage => {
                self.handle_test_coverage(normalized, &mut session).await
            }
            ConversationState::SkipConfirmation => {
                self.handle_skip_confirmation(normalized, &mut session).await
            }
            ConversationState::Confirmation => {
                self.handle_confirmation(normalized, &mut session, today).await
            }
            ConversationState::Saved => formatters::ALREADY_SAVED.to_string(),
            ConversationState::Unknown => formatters::unknown_state_message(),
        };

        session.append_history(Role::Assistant, response.clone());
        info!(
            from = %from_state,
            to = %session.state,
            latency_ms = started.elapsed().as_millis() as u64,
            "turn handled"
        );
        (response, session)
    }

    fn default_period(&self, today: NaiveDate) -> Option<ReportingPeriod> {
        ReportingPeriod::default_for(today, self.grace_period_days).ok()
    }

    async fn handle_project_id(
        &self,
        message: &str,
        session: &mut ConversationSession,
        today: NaiveDate,
    ) -> String {
        match self.extractor.extract_project(message, &self.registry).await {
            Ok(matched) if matched.confidence.is_high() => {
                self.commit_project(session, matched.project_id, today)
            }
            Ok(matched) => {
                let name = self
                    .registry
                    .display_name(matched.project_id.as_str())
                    .to_string();
                debug!(project_id = %matched.project_id, confidence = matched.confidence.as_str(), "project needs confirmation");
                session.pending_project = Some(matched.project_id);
                session.pending_confidence = Some(matched.confidence);
                session.state = ConversationState::ProjectConfirmation;
                formatters::format_project_confirmation(&name)
            }
            Err(err) => {
                debug!(error = %err, "project extraction failed, falling back to registry lookup");
                match self.registry.find_project(message).map(|p| p.project_id()) {
                    Some(Ok(project_id)) => self.commit_project(session, project_id, today),
                    Some(Err(err)) => Self::error_with_prompt(&err, formatters::prompt_for_project()),
                    None => match ProjectId::parse(message) {
                        Ok(_) => formatters::project_not_matched(),
                        Err(err) => Self::error_with_prompt(&err, formatters::prompt_for_project()),
                    },
                }
            }
        }
    }

    fn commit_project(
        &self,
        session: &mut ConversationSession,
        project_id: ProjectId,
        today: NaiveDate,
    ) -> String {
        debug!(project_id = %project_id, "project selected");
        session.project = Some(project_id);
        session.clear_pending();
        session.state = ConversationState::TimeWindow;
        formatters::prompt_for_time_window(self.default_period(today))
    }

    fn handle_project_confirmation(
        &self,
        message: &str,
        session: &mut ConversationSession,
        today: NaiveDate,
    ) -> String {
        if intent::is_affirmative(message) {
            if let Some(project_id) = session.pending_project.take() {
                return self.commit_project(session, project_id, today);
            }
        }

        session.clear_pending();
        session.state = ConversationState::ProjectId;
        format!("No problem. {}", formatters::prompt_for_project())
    }

    /// Aliases and literal `YYYY-MM` tokens, resolved without the extractor.
    fn resolve_local_period(
        &self,
        message: &str,
        today: NaiveDate,
    ) -> Option<DomainResult<ReportingPeriod>> {
        match intent::period_alias(message) {
            Some(PeriodAlias::Current) => {
                Some(ReportingPeriod::default_for(today, self.grace_period_days))
            }
            Some(PeriodAlias::Previous) => Some(ReportingPeriod::previous_for(today)),
            None => intent::explicit_month(message).map(ReportingPeriod::parse_iso),
        }
    }

    async fn handle_time_window(
        &self,
        message: &str,
        session: &mut ConversationSession,
        today: NaiveDate,
    ) -> String {
        let resolved = match self.resolve_local_period(message, today) {
            Some(local) => local,
            None => self.extractor.extract_period(message, today).await,
        };

        match resolved {
            Ok(period) => {
                debug!(period = %period, "reporting period selected");
                session.period = Some(period);
                session.state = ConversationState::TestCoverage;
                formatters::prompt_for_test_coverage()
            }
            Err(err) => Self::error_with_prompt(
                &err,
                formatters::prompt_for_time_window(self.default_period(today)),
            ),
        }
    }

    async fn handle_test_coverage(&self, message: &str, session: &mut ConversationSession) -> String {
        if intent::is_skip_request(message) {
            session.pending_section = Some(ConversationState::TestCoverage);
            session.state = ConversationState::SkipConfirmation;
            return formatters::format_skip_confirmation(
                ConversationState::TestCoverage.section_label(),
            );
        }

        match self.extractor.extract_coverage(message).await {
            Ok(extraction) => {
                session.coverage_metrics = Some(extraction.coverage).filter(|c| !c.is_empty());
                session.supported_releases_count = extraction.supported_releases_count;
                session.state = ConversationState::Confirmation;
                self.confirmation_prompt(session)
            }
            Err(err) => Self::error_with_prompt(&err, formatters::prompt_for_test_coverage()),
        }
    }

    async fn handle_skip_confirmation(
        &self,
        message: &str,
        session: &mut ConversationSession,
    ) -> String {
        let Some(pending) = session.pending_section.take() else {
            session.state = ConversationState::Confirmation;
            return format!(
                "{} {}",
                formatters::format_error_message("There was no section waiting to be skipped."),
                self.confirmation_prompt(session)
            );
        };

        if intent::is_affirmative(message) {
            session.state = ConversationState::Confirmation;
            return self.confirmation_prompt(session);
        }

        session.state = pending;
        match pending {
            ConversationState::TestCoverage => self.handle_test_coverage(message, session).await,
            _ => formatters::format_error_message("Unable to resume section."),
        }
    }

    async fn handle_confirmation(
        &self,
        message: &str,
        session: &mut ConversationSession,
        today: NaiveDate,
    ) -> String {
        if intent::is_affirmative(message) {
            return self.submit(session).await;
        }

        match intent::detect_edit_target(message) {
            Some(target) => {
                debug!(section = %target, "editing section");
                session.reset_section(target);
                session.state = target;
                self.prompt_for_state(target, today)
            }
            None => formatters::EDIT_SECTION_PROMPT.to_string(),
        }
    }

    async fn submit(&self, session: &mut ConversationSession) -> String {
        if !session.has_data() {
            return formatters::missing_data_prompt();
        }

        let command = match SubmissionCommand::from_session(session) {
            Ok(command) => command,
            Err(err) => {
                error!(error = %err, "confirmation reached without project or period");
                return formatters::format_error_message(&err.to_string());
            }
        };

        match self.submissions.submit(command).await {
            Ok(submission) => {
                info!(submission_id = %submission.id, "submission stored");
                session.state = ConversationState::Saved;
                formatters::format_saved_message()
            }
            Err(err) => {
                error!(error = %err, "submission failed");
                formatters::format_error_message(&err.to_string())
            }
        }
    }

    fn confirmation_prompt(&self, session: &ConversationSession) -> String {
        let (Some(project), Some(period)) = (&session.project, session.period) else {
            return formatters::format_error_message("Missing project or reporting month information.");
        };

        let summary = formatters::format_submission_summary(
            &self.registry,
            project,
            period,
            session.coverage_metrics.as_ref(),
            session.supported_releases_count,
        );
        formatters::prompt_for_confirmation(&summary)
    }

    fn prompt_for_state(&self, state: ConversationState, today: NaiveDate) -> String {
        match state {
            ConversationState::ProjectId => formatters::prompt_for_project(),
            ConversationState::TimeWindow => {
                formatters::prompt_for_time_window(self.default_period(today))
            }
            ConversationState::TestCoverage => formatters::prompt_for_test_coverage(),
            _ => "Please share the update.".to_string(),
        }
    }

    fn error_with_prompt(err: &impl std::fmt::Display, prompt: String) -> String {
        format!("{} {prompt}", formatters::format_error_message(&err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteSubmissionRepository};
    use crate::domain::errors::DomainError;
    use crate::domain::models::{default_portfolio, Confidence, CoverageMetrics, Submission};
    use crate::domain::ports::{CoverageExtraction, ProjectMatch};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Extractor returning canned results; `None` means the call fails.
    #[derive(Default)]
    struct FakeExtractor {
        project: Option<ProjectMatch>,
        period: Option<ReportingPeriod>,
        coverage: Option<CoverageExtraction>,
        period_calls: AtomicUsize,
    }

    #[async_trait]
    impl ExtractionPort for FakeExtractor {
        async fn extract_project(
            &self,
            _text: &str,
            _registry: &ProjectRegistry,
        ) -> DomainResult<ProjectMatch> {
            self.project
                .clone()
                .ok_or_else(|| DomainError::ExtractionFailed("service unavailable".to_string()))
        }

        async fn extract_period(&self, _text: &str, _today: NaiveDate) -> DomainResult<ReportingPeriod> {
            self.period_calls.fetch_add(1, Ordering::SeqCst);
            self.period
                .ok_or_else(|| DomainError::AmbiguousExtraction("reporting month".to_string()))
        }

        async fn extract_coverage(&self, _text: &str) -> DomainResult<CoverageExtraction> {
            self.coverage
                .ok_or_else(|| DomainError::AmbiguousExtraction("test coverage".to_string()))
        }
    }

    struct FailingRepository;

    #[async_trait]
    impl SubmissionRepository for FailingRepository {
        async fn save(&self, _submission: &Submission) -> DomainResult<()> {
            Err(DomainError::StorageFailed("database is locked".to_string()))
        }

        async fn latest_for(
            &self,
            _project: &ProjectId,
            _period: ReportingPeriod,
        ) -> DomainResult<Option<Submission>> {
            Ok(None)
        }

        async fn list_for(
            &self,
            _project: &ProjectId,
            _period: ReportingPeriod,
        ) -> DomainResult<Vec<Submission>> {
            Ok(Vec::new())
        }

        async fn list_by_period(&self, _period: ReportingPeriod) -> DomainResult<Vec<Submission>> {
            Ok(Vec::new())
        }

        async fn all_projects(&self) -> DomainResult<Vec<ProjectId>> {
            Ok(Vec::new())
        }

        async fn recent_periods(&self, _limit: u32) -> DomainResult<Vec<ReportingPeriod>> {
            Ok(Vec::new())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 10).unwrap()
    }

    fn project_match(id: &str, confidence: Confidence) -> ProjectMatch {
        ProjectMatch {
            project_id: ProjectId::parse(id).unwrap(),
            confidence,
        }
    }

    fn coverage_extraction() -> CoverageExtraction {
        CoverageExtraction {
            coverage: CoverageMetrics {
                manual_total: Some(1000),
                automated_total: Some(500),
                ..Default::default()
            },
            supported_releases_count: Some(2),
        }
    }

    fn full_extractor() -> FakeExtractor {
        FakeExtractor {
            project: Some(project_match("bridge", Confidence::High)),
            period: Some(ReportingPeriod::new(2026, 1).unwrap()),
            coverage: Some(coverage_extraction()),
            ..Default::default()
        }
    }

    async fn sqlite_engine(
        extractor: FakeExtractor,
    ) -> DialogueEngine<FakeExtractor, SqliteSubmissionRepository> {
        let pool = create_migrated_test_pool().await.unwrap();
        let service = SubmissionService::new(Arc::new(SqliteSubmissionRepository::new(pool)));
        DialogueEngine::new(Arc::new(extractor), service, Arc::new(default_portfolio()))
    }

    fn failing_engine(extractor: FakeExtractor) -> DialogueEngine<FakeExtractor, FailingRepository> {
        let service = SubmissionService::new(Arc::new(FailingRepository));
        DialogueEngine::new(Arc::new(extractor), service, Arc::new(default_portfolio()))
    }

    async fn drive<E: ExtractionPort, R: SubmissionRepository>(
        engine: &DialogueEngine<E, R>,
        session: ConversationSession,
        messages: &[&str],
    ) -> (String, ConversationSession) {
        let mut session = session;
        let mut response = String::new();
        for message in messages {
            let (reply, next) = engine.handle_message(message, session, today()).await;
            response = reply;
            session = next;
        }
        (response, session)
    }

    /// Session parked at confirmation with project, period and coverage filled in.
    async fn confirmation_session<E: ExtractionPort, R: SubmissionRepository>(
        engine: &DialogueEngine<E, R>,
    ) -> ConversationSession {
        let (session, _) = engine.start_session(today());
        let (_, session) = drive(engine, session, &["bridge", "2026-01", "1000 manual, 500 automated"]).await;
        assert_eq!(session.state, ConversationState::Confirmation);
        session
    }

    #[tokio::test]
    async fn test_start_session_records_welcome() {
        let engine = sqlite_engine(full_extractor()).await;
        let (session, welcome) = engine.start_session(today());

        assert_eq!(session.state, ConversationState::ProjectId);
        assert!(welcome.contains("2026-02"));
        assert_eq!(session.history.len(), 1);
        assert_eq!(session.history[0].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_whitespace_never_changes_state() {
        let engine = sqlite_engine(full_extractor()).await;
        let session = confirmation_session(&engine).await;
        let history_len = session.history.len();

        let (response, after) = engine.handle_message("   \n\t", session, today()).await;
        assert_eq!(response, formatters::EMPTY_MESSAGE_PROMPT);
        assert_eq!(after.state, ConversationState::Confirmation);
        assert_eq!(after.history.len(), history_len);
    }

    #[tokio::test]
    async fn test_skip_then_confirm_without_data_is_not_saved() {
        let engine = sqlite_engine(full_extractor()).await;
        let (session, _) = engine.start_session(today());

        let (_, session) = drive(&engine, session, &["bridge"]).await;
        assert_eq!(session.state, ConversationState::TimeWindow);

        let (_, session) = drive(&engine, session, &["2026-01"]).await;
        assert_eq!(session.state, ConversationState::TestCoverage);
        assert_eq!(session.period.unwrap().to_iso_month(), "2026-01");

        let (_, session) = drive(&engine, session, &["skip"]).await;
        assert_eq!(session.state, ConversationState::SkipConfirmation);
        assert_eq!(session.pending_section, Some(ConversationState::TestCoverage));

        let (_, session) = drive(&engine, session, &["yes"]).await;
        assert_eq!(session.state, ConversationState::Confirmation);
        assert!(session.pending_section.is_none());

        let (response, session) = drive(&engine, session, &["yes"]).await;
        assert_eq!(session.state, ConversationState::Confirmation);
        assert!(response.contains("coverage"));
        assert!(engine.submissions.reported_projects().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_full_flow_saves_and_blocks_further_input() {
        let engine = sqlite_engine(full_extractor()).await;
        let session = confirmation_session(&engine).await;

        let (response, session) = drive(&engine, session, &["yes"]).await;
        assert_eq!(response, formatters::format_saved_message());
        assert_eq!(session.state, ConversationState::Saved);

        let stored = engine
            .submissions
            .latest(&ProjectId::parse("bridge").unwrap(), ReportingPeriod::new(2026, 1).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.metrics.supported_releases_count, Some(2));
        assert!(stored.raw_conversation.unwrap().contains("User: bridge"));

        let before = session.history.len();
        let (response, session) = drive(&engine, session, &["hello?"]).await;
        assert_eq!(response, formatters::ALREADY_SAVED);
        assert_eq!(session.state, ConversationState::Saved);
        assert_eq!(session.history.len(), before + 2);
    }

    #[tokio::test]
    async fn test_restart_after_save_returns_fresh_session() {
        let engine = sqlite_engine(full_extractor()).await;
        let session = confirmation_session(&engine).await;
        let (_, saved) = drive(&engine, session, &["yes"]).await;
        let old_id = saved.id;

        let (response, fresh) = drive(&engine, saved, &["Start over"]).await;
        assert_eq!(fresh.state, ConversationState::ProjectId);
        assert_ne!(fresh.id, old_id);
        assert!(fresh.project.is_none());
        assert_eq!(fresh.history.len(), 1);
        assert_eq!(fresh.history[0].content, response);
    }

    #[tokio::test]
    async fn test_edit_project_clears_everything() {
        let engine = sqlite_engine(full_extractor()).await;
        let session = confirmation_session(&engine).await;

        let (response, session) = drive(&engine, session, &["change the project"]).await;
        assert_eq!(session.state, ConversationState::ProjectId);
        assert!(session.project.is_none());
        assert!(session.period.is_none());
        assert!(session.coverage_metrics.is_none());
        assert!(session.supported_releases_count.is_none());
        assert_eq!(response, formatters::prompt_for_project());
    }

    #[tokio::test]
    async fn test_edit_month_keeps_project() {
        let engine = sqlite_engine(full_extractor()).await;
        let session = confirmation_session(&engine).await;

        let (response, session) = drive(&engine, session, &["wrong month"]).await;
        assert_eq!(session.state, ConversationState::TimeWindow);
        assert_eq!(session.project.as_ref().unwrap().as_str(), "bridge");
        assert!(session.period.is_none());
        assert!(session.coverage_metrics.is_none());
        assert!(response.contains("(Default: 2026-02)"));
    }

    #[tokio::test]
    async fn test_edit_coverage_keeps_project_and_period() {
        let engine = sqlite_engine(full_extractor()).await;
        let session = confirmation_session(&engine).await;

        let (_, session) = drive(&engine, session, &["update coverage"]).await;
        assert_eq!(session.state, ConversationState::TestCoverage);
        assert!(session.project.is_some());
        assert!(session.period.is_some());
        assert!(!session.has_data());
    }

    #[tokio::test]
    async fn test_unrecognized_reply_at_confirmation_asks_for_section() {
        let engine = sqlite_engine(full_extractor()).await;
        let session = confirmation_session(&engine).await;

        let (response, session) = drive(&engine, session, &["hmm"]).await;
        assert_eq!(response, formatters::EDIT_SECTION_PROMPT);
        assert_eq!(session.state, ConversationState::Confirmation);
        assert!(session.has_data());
    }

    #[tokio::test]
    async fn test_medium_confidence_requires_confirmation() {
        let extractor = FakeExtractor {
            project: Some(project_match("payments", Confidence::Medium)),
            ..full_extractor()
        };
        let engine = sqlite_engine(extractor).await;
        let (session, _) = engine.start_session(today());

        let (response, session) = drive(&engine, session, &["qa project"]).await;
        assert_eq!(session.state, ConversationState::ProjectConfirmation);
        assert_eq!(session.pending_project.as_ref().unwrap().as_str(), "payments");
        assert_eq!(session.pending_confidence, Some(Confidence::Medium));
        assert!(response.contains("Payments"));

        let (_, confirmed) = drive(&engine, session.clone(), &["yes"]).await;
        assert_eq!(confirmed.state, ConversationState::TimeWindow);
        assert_eq!(confirmed.project.as_ref().unwrap().as_str(), "payments");
        assert!(confirmed.pending_project.is_none());
        assert!(confirmed.pending_confidence.is_none());

        let (response, rejected) = drive(&engine, session, &["no"]).await;
        assert_eq!(rejected.state, ConversationState::ProjectId);
        assert!(rejected.pending_project.is_none());
        assert!(rejected.project.is_none());
        assert!(response.starts_with("No problem."));
    }

    #[tokio::test]
    async fn test_low_confidence_requires_confirmation() {
        let extractor = FakeExtractor {
            project: Some(project_match("jtools", Confidence::Low)),
            ..full_extractor()
        };
        let engine = sqlite_engine(extractor).await;
        let (session, _) = engine.start_session(today());

        let (response, session) = drive(&engine, session, &["the old one"]).await;
        assert_eq!(session.state, ConversationState::ProjectConfirmation);
        assert_eq!(session.pending_project.as_ref().unwrap().as_str(), "jtools");
        assert_eq!(session.pending_confidence, Some(Confidence::Low));
        assert!(session.project.is_none());
        assert_eq!(response, formatters::format_project_confirmation("JTools"));
    }

    #[tokio::test]
    async fn test_affirmative_without_pending_project_returns_to_project_prompt() {
        let engine = sqlite_engine(full_extractor()).await;
        let (mut session, _) = engine.start_session(today());
        session.state = ConversationState::ProjectConfirmation;
        session.pending_confidence = Some(Confidence::Medium);

        let (response, session) = drive(&engine, session, &["yes"]).await;
        assert_eq!(session.state, ConversationState::ProjectId);
        assert!(session.project.is_none());
        assert!(session.pending_project.is_none());
        assert!(session.pending_confidence.is_none());
        assert_eq!(response, format!("No problem. {}", formatters::prompt_for_project()));
    }

    #[tokio::test]
    async fn test_extraction_failure_falls_back_to_registry() {
        let extractor = FakeExtractor {
            project: None,
            ..full_extractor()
        };
        let engine = sqlite_engine(extractor).await;
        let (session, _) = engine.start_session(today());

        let (_, session) = drive(&engine, session, &["Withdrawals"]).await;
        assert_eq!(session.state, ConversationState::TimeWindow);
        assert_eq!(session.project.as_ref().unwrap().as_str(), "withdrawals");

        let (session, _) = engine.start_session(today());
        let (response, session) = drive(&engine, session, &["the secret project"]).await;
        assert_eq!(session.state, ConversationState::ProjectId);
        assert!(response.starts_with("I ran into an issue: I couldn't match that to a known project."));
    }

    #[tokio::test]
    async fn test_period_aliases_skip_extraction() {
        let engine = sqlite_engine(full_extractor()).await;
        let (session, _) = engine.start_session(today());
        let (_, session) = drive(&engine, session, &["bridge", "last month"]).await;

        assert_eq!(session.period.unwrap().to_iso_month(), "2026-01");
        assert_eq!(engine.extractor.period_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_literal_month_reprompts() {
        let engine = sqlite_engine(full_extractor()).await;
        let (session, _) = engine.start_session(today());
        let (response, session) = drive(&engine, session, &["bridge", "2026-13"]).await;

        assert_eq!(session.state, ConversationState::TimeWindow);
        assert!(session.period.is_none());
        assert!(response.starts_with("I ran into an issue: Month must be between 1 and 12"));
        assert!(response.contains("Which reporting month should I use?"));
        assert_eq!(engine.extractor.period_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_period_extraction_failure_reprompts_with_default() {
        let extractor = FakeExtractor {
            period: None,
            ..full_extractor()
        };
        let engine = sqlite_engine(extractor).await;
        let (session, _) = engine.start_session(today());
        let (response, session) = drive(&engine, session, &["bridge", "sometime in winter"]).await;

        assert_eq!(session.state, ConversationState::TimeWindow);
        assert!(response.contains("couldn't confidently determine the reporting month"));
        assert!(response.ends_with("(Default: 2026-02)"));
    }

    #[tokio::test]
    async fn test_month_fragment_in_text_goes_to_extraction() {
        let engine = sqlite_engine(full_extractor()).await;
        let (session, _) = engine.start_session(today());
        let (response, session) = drive(&engine, session, &["bridge", "FY 2025-26 figures"]).await;

        assert_eq!(engine.extractor.period_calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.state, ConversationState::TestCoverage);
        assert_eq!(session.period.unwrap().to_iso_month(), "2026-01");
        assert_eq!(response, formatters::prompt_for_test_coverage());
    }

    #[tokio::test]
    async fn test_coverage_extraction_failure_stays_in_coverage() {
        let extractor = FakeExtractor {
            coverage: None,
            ..full_extractor()
        };
        let engine = sqlite_engine(extractor).await;
        let (session, _) = engine.start_session(today());
        let (response, session) =
            drive(&engine, session, &["bridge", "2026-01", "we did some testing"]).await;

        assert_eq!(session.state, ConversationState::TestCoverage);
        assert!(session.coverage_metrics.is_none());
        assert!(session.supported_releases_count.is_none());
        assert!(response.starts_with("I ran into an issue: "));
        assert!(response.ends_with(&formatters::prompt_for_test_coverage()));
    }

    #[tokio::test]
    async fn test_declining_skip_reprocesses_message_as_coverage() {
        let engine = sqlite_engine(full_extractor()).await;
        let (session, _) = engine.start_session(today());
        let (_, session) = drive(&engine, session, &["bridge", "2026-01", "skip"]).await;

        let (response, session) = drive(&engine, session, &["1000 manual tests"]).await;
        assert_eq!(session.state, ConversationState::Confirmation);
        assert!(session.has_data());
        assert!(response.contains("- Manual total: 1000"));
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_confirmation() {
        let engine = failing_engine(full_extractor());
        let session = confirmation_session(&engine).await;

        let (response, session) = drive(&engine, session, &["yes"]).await;
        assert_eq!(session.state, ConversationState::Confirmation);
        assert!(response.contains("database is locked"));
        assert!(session.has_data());
        assert!(session.project.is_some());
    }

    #[tokio::test]
    async fn test_unknown_state_reports_error() {
        let engine = sqlite_engine(full_extractor()).await;
        let mut session = ConversationSession::new();
        session.state = ConversationState::Unknown;

        let before = session.clone();

        let (response, session) = engine.handle_message("hello", session, today()).await;
        assert_eq!(response, formatters::unknown_state_message());
        assert_eq!(session, before);
    }

    #[tokio::test]
    async fn test_skip_confirmation_without_pending_section_recovers() {
        let engine = sqlite_engine(full_extractor()).await;
        let mut session = confirmation_session(&engine).await;
        session.state = ConversationState::SkipConfirmation;

        let (response, session) = drive(&engine, session, &["yes"]).await;
        assert_eq!(session.state, ConversationState::Confirmation);
        assert!(response.starts_with("I ran into an issue: There was no section waiting to be skipped."));
        assert!(response.contains("Here is what I captured:"));
    }

    #[tokio::test]
    async fn test_history_records_both_sides() {
        let engine = sqlite_engine(full_extractor()).await;
        let (session, welcome) = engine.start_session(today());
        let (response, session) = engine.handle_message("  bridge  ", session, today()).await;

        let roles: Vec<Role> = session.history.iter().map(|e| e.role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
        assert_eq!(session.history[0].content, welcome);
        assert_eq!(session.history[1].content, "bridge");
        assert_eq!(session.history[2].content, response);
    }
}
