//! Response texts produced by the dialogue engine.

use std::fmt::Write as _;
use std::time::Duration;

use crate::domain::models::{CoverageMetrics, ProjectId, ProjectRegistry, ReportingPeriod};

/// Reply to a blank or whitespace-only message.
pub const EMPTY_MESSAGE_PROMPT: &str = "Please share a response so I can continue.";
/// Reply to anything but a restart once the update is saved.
pub const ALREADY_SAVED: &str =
    "Your submission is saved. Reply with 'start over' to submit another update.";
/// Reply when a confirmation answer names no section to edit.
pub const EDIT_SECTION_PROMPT: &str =
    "Which section should I update? You can say project, month, or test coverage.";

fn default_hint(default_period: Option<ReportingPeriod>) -> String {
    default_period
        .map(|period| format!(" (Default: {})", period.to_iso_month()))
        .unwrap_or_default()
}

/// Greeting that opens every session, naming the default month.
pub fn welcome_message(default_period: Option<ReportingPeriod>) -> String {
    let month = default_period.map_or_else(
        || "the current reporting month".to_string(),
        |period| period.to_iso_month(),
    );
    format!(
        "Hi! I can help collect monthly QA test coverage for your project. \
         This will default to {month} unless you specify another month. \
         Which project are you reporting for?"
    )
}

/// Ask which project the update is for.
pub fn prompt_for_project() -> String {
    "Which project are you reporting for? You can use the project name or its ID.".to_string()
}

/// Ask for the reporting month, with the default in parentheses when known.
pub fn prompt_for_time_window(default_period: Option<ReportingPeriod>) -> String {
    format!(
        "Which reporting month should I use?{}",
        default_hint(default_period)
    )
}

pub fn prompt_for_test_coverage() -> String {
    "Share your test coverage: manual and automated test totals, tests created or updated \
     this month, and how many releases you support. Say 'skip' if there is nothing to report."
        .to_string()
}

/// Ask the user to confirm a project matched with less than high confidence.
pub fn format_project_confirmation(project_name: &str) -> String {
    format!("Did you mean {project_name}? Reply with 'yes' to confirm or 'no' to pick another project.")
}

/// Wrap a summary in the final save-or-edit question.
pub fn prompt_for_confirmation(summary: &str) -> String {
    format!("Here is what I captured:\n\n{summary}\n\nReply with 'yes' to save or tell me what to change.")
}

/// Prefix shared by every recoverable error reply.
pub fn format_error_message(message: &str) -> String {
    format!("I ran into an issue: {message}")
}

/// Ask whether the named section really has nothing to report.
pub fn format_skip_confirmation(section_label: &str) -> String {
    format!(
        "Okay, we can skip {section_label}. Reply with 'yes' to confirm, or send details if you want to include it."
    )
}

pub fn format_saved_message() -> String {
    "Thanks! Your update has been saved.".to_string()
}

/// Error plus re-prompt when no registry project matches.
pub fn project_not_matched() -> String {
    format!(
        "{} {}",
        format_error_message("I couldn't match that to a known project."),
        prompt_for_project()
    )
}

/// Error when confirming a submission with no coverage or release data.
pub fn missing_data_prompt() -> String {
    format!(
        "{} Reply with 'coverage' to add test coverage details.",
        format_error_message("There is no test coverage or release data to save yet.")
    )
}

/// Reply for a session whose stored state is not recognised.
pub fn unknown_state_message() -> String {
    format_error_message("Conversation is in an unknown state.")
}

/// Rejection for a session over its message rate, rounded up to whole seconds.
pub fn rate_limited_message(retry_after: Duration) -> String {
    format!(
        "You're sending messages too quickly. Please wait {} seconds and try again.",
        retry_after.as_secs().max(1)
    )
}

/// Rejection for a message longer than `max_chars` characters.
pub fn input_too_long_message(max_chars: usize) -> String {
    format_error_message(&format!(
        "Messages are limited to {max_chars} characters. Please shorten your reply."
    ))
}

/// Multi-line summary of the data collected so far.
pub fn format_submission_summary(
    registry: &ProjectRegistry,
    project: &ProjectId,
    period: ReportingPeriod,
    coverage: Option<&CoverageMetrics>,
    supported_releases_count: Option<u32>,
) -> String {
    let mut summary = String::new();
    let name = registry.display_name(project.as_str());
    if name == project.as_str() {
        let _ = writeln!(summary, "Project: {project}");
    } else {
        let _ = writeln!(summary, "Project: {name} ({project})");
    }
    let _ = write!(summary, "Month: {}", period.to_iso_month());

    if let Some(count) = supported_releases_count {
        let _ = write!(summary, "\nSupported releases count: {count}");
    }

    match coverage.filter(|c| !c.is_empty()) {
        Some(metrics) => summary.push_str(&format_coverage(metrics)),
        None => summary.push_str("\nTest Coverage: not provided"),
    }
    summary
}

fn format_coverage(metrics: &CoverageMetrics) -> String {
    let fields = [
        ("Manual total", metrics.manual_total),
        ("Automated total", metrics.automated_total),
        ("Manual created this month", metrics.manual_created_in_period),
        ("Manual updated this month", metrics.manual_updated_in_period),
        ("Automated created this month", metrics.automated_created_in_period),
        ("Automated updated this month", metrics.automated_updated_in_period),
    ];

    let mut block = String::from("\nTest Coverage:");
    for (label, value) in fields {
        if let Some(value) = value {
            let _ = write!(block, "\n- {label}: {value}");
        }
    }
    if let Some(percentage) = metrics.automation_percentage() {
        let _ = write!(block, "\n- Automation: {percentage:.2}%");
    }
    block
}
