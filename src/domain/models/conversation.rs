//! Conversation session state tracked across dialogue turns.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::confidence::Confidence;
use super::metrics::CoverageMetrics;
use super::period::ReportingPeriod;
use super::project::ProjectId;

/// Step of the intake dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    ProjectId,
    ProjectConfirmation,
    TimeWindow,
    TestCoverage,
    SkipConfirmation,
    Confirmation,
    Saved,
    /// Any state value this build does not recognize.
    #[serde(other)]
    Unknown,
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectId => "project_id",
            Self::ProjectConfirmation => "project_confirmation",
            Self::TimeWindow => "time_window",
            Self::TestCoverage => "test_coverage",
            Self::SkipConfirmation => "skip_confirmation",
            Self::Confirmation => "confirmation",
            Self::Saved => "saved",
            Self::Unknown => "unknown",
        }
    }

    /// Human label of the section a data-collecting state gathers.
    pub fn section_label(&self) -> &'static str {
        match self {
            Self::ProjectId | Self::ProjectConfirmation => "project",
            Self::TimeWindow => "reporting month",
            Self::TestCoverage => "test coverage",
            Self::SkipConfirmation | Self::Confirmation | Self::Saved | Self::Unknown => "update",
        }
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Author of a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Capitalized form used in transcripts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

/// Mutable per-conversation state.
///
/// `pending_project` and `pending_confidence` are only set while in
/// `ProjectConfirmation`; `pending_section` only while in `SkipConfirmation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: Uuid,
    #[serde(default)]
    pub state: ConversationState,
    #[serde(default)]
    pub project: Option<ProjectId>,
    #[serde(default)]
    pub period: Option<ReportingPeriod>,
    #[serde(default)]
    pub coverage_metrics: Option<CoverageMetrics>,
    #[serde(default)]
    pub supported_releases_count: Option<u32>,
    #[serde(default)]
    pub pending_project: Option<ProjectId>,
    #[serde(default)]
    pub pending_confidence: Option<Confidence>,
    #[serde(default)]
    pub pending_section: Option<ConversationState>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl ConversationSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: ConversationState::ProjectId,
            project: None,
            period: None,
            coverage_metrics: None,
            supported_releases_count: None,
            pending_project: None,
            pending_confidence: None,
            pending_section: None,
            history: Vec::new(),
        }
    }

    pub fn append_history(&mut self, role: Role, content: impl Into<String>) {
        self.history.push(HistoryEntry {
            role,
            content: content.into(),
        });
    }

    /// `Role: content` lines for every non-empty history entry.
    pub fn transcript(&self) -> String {
        self.history
            .iter()
            .filter(|entry| !entry.content.is_empty())
            .map(|entry| format!("{}: {}", entry.role.label(), entry.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// True when coverage or release data has been collected.
    pub fn has_data(&self) -> bool {
        self.coverage_metrics.is_some_and(|c| !c.is_empty())
            || self.supported_releases_count.is_some()
    }

    pub fn clear_pending(&mut self) {
        self.pending_project = None;
        self.pending_confidence = None;
        self.pending_section = None;
    }

    /// Clear the data collected for `section` and everything collected after it.
    pub fn reset_section(&mut self, section: ConversationState) {
        self.clear_pending();
        match section {
            ConversationState::ProjectId => {
                self.project = None;
                self.period = None;
                self.clear_coverage();
            }
            ConversationState::TimeWindow => {
                self.period = None;
                self.clear_coverage();
            }
            ConversationState::TestCoverage => self.clear_coverage(),
            _ => {}
        }
    }

    fn clear_coverage(&mut self) {
        self.coverage_metrics = None;
        self.supported_releases_count = None;
    }
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new()
    }
}
