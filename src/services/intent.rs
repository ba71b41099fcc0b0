//! Keyword intent detection for user replies.
//!
//! Intents are exact allow-list membership after trimming and lowercasing;
//! edit targets are substring matches.

use crate::domain::models::ConversationState;

const AFFIRMATIVE: &[&str] = &["yes", "y", "yep", "sure", "confirm", "ok", "okay"];
const SKIP: &[&str] = &["skip", "no", "none", "n/a", "na", "nothing"];
const RESTART: &[&str] = &["start", "start over", "restart", "new"];
const CURRENT_PERIOD: &[&str] = &["default", "current", "current month", "this month"];
const PREVIOUS_PERIOD: &[&str] = &["previous", "last month", "previous month"];

/// Relative month named by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodAlias {
    Current,
    Previous,
}

fn normalize(message: &str) -> String {
    message.trim().to_lowercase()
}

fn is_one_of(message: &str, phrases: &[&str]) -> bool {
    phrases.contains(&normalize(message).as_str())
}

pub fn is_affirmative(message: &str) -> bool {
    is_one_of(message, AFFIRMATIVE)
}

pub fn is_skip_request(message: &str) -> bool {
    is_one_of(message, SKIP)
}

pub fn is_restart_request(message: &str) -> bool {
    is_one_of(message, RESTART)
}

pub fn period_alias(message: &str) -> Option<PeriodAlias> {
    if is_one_of(message, CURRENT_PERIOD) {
        Some(PeriodAlias::Current)
    } else if is_one_of(message, PREVIOUS_PERIOD) {
        Some(PeriodAlias::Previous)
    } else {
        None
    }
}

/// The whole message when it is shaped like `YYYY-MM` (or `YYYY-M`).
///
/// Only the shape is checked; range validation is left to the caller.
/// Month-like fragments inside longer text are left for extraction.
pub fn explicit_month(message: &str) -> Option<&str> {
    let candidate = message
        .trim()
        .trim_end_matches(|c: char| matches!(c, '.' | '!' | '?'));
    looks_like_month(candidate).then_some(candidate)
}

fn looks_like_month(token: &str) -> bool {
    let Some((year, month)) = token.split_once('-') else {
        return false;
    };
    year.len() == 4
        && (1..=2).contains(&month.len())
        && year.chars().all(|c| c.is_ascii_digit())
        && month.chars().all(|c| c.is_ascii_digit())
}

/// Section the user wants to change, checked as project, then month, then coverage.
pub fn detect_edit_target(message: &str) -> Option<ConversationState> {
    let normalized = normalize(message);
    if normalized.contains("project") {
        Some(ConversationState::ProjectId)
    } else if normalized.contains("month") || normalized.contains("time") {
        Some(ConversationState::TimeWindow)
    } else if normalized.contains("coverage") || normalized.contains("test") {
        Some(ConversationState::TestCoverage)
    } else {
        None
    }
}
