//! `qa-intake submissions`: query stored submissions.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use super::submission_service;
use crate::cli::output::{list_table, or_dash, output, render_list, CommandOutput};
use crate::domain::models::{Config, ProjectId, ProjectRegistry, ReportingPeriod, Submission};

#[derive(Args, Debug)]
pub struct SubmissionsArgs {
    #[command(subcommand)]
    pub command: SubmissionsCommands,
}

#[derive(Subcommand, Debug)]
pub enum SubmissionsCommands {
    /// List submissions for a month, optionally narrowed to one project
    List {
        /// Reporting month (YYYY-MM)
        #[arg(short, long)]
        month: String,
        /// Project id or name
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Show the latest merged submission for a project and month
    Latest {
        /// Project id or name
        #[arg(short, long)]
        project: String,
        /// Reporting month (YYYY-MM)
        #[arg(short, long)]
        month: String,
    },
    /// List months that have submissions, newest first
    Months {
        /// Maximum number of months to show
        #[arg(short, long, default_value = "12")]
        limit: u32,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct SubmissionOutput {
    pub id: String,
    pub project_id: String,
    pub project_name: String,
    pub month: String,
    pub manual_total: Option<u32>,
    pub automated_total: Option<u32>,
    pub automation_percentage: Option<f64>,
    pub supported_releases_count: Option<u32>,
    pub created_at: String,
}

impl SubmissionOutput {
    fn new(submission: &Submission, registry: &ProjectRegistry) -> Self {
        let coverage = submission.metrics.coverage.unwrap_or_default();
        Self {
            id: submission.id.to_string(),
            project_id: submission.project.to_string(),
            project_name: registry.display_name(submission.project.as_str()).to_string(),
            month: submission.period.to_iso_month(),
            manual_total: coverage.manual_total,
            automated_total: coverage.automated_total,
            automation_percentage: coverage.automation_percentage(),
            supported_releases_count: submission.metrics.supported_releases_count,
            created_at: submission.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct SubmissionListOutput {
    pub submissions: Vec<SubmissionOutput>,
    pub total: usize,
}

impl CommandOutput for SubmissionListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["project", "month", "manual", "automated", "releases", "created"]);
        for s in &self.submissions {
            table.add_row(vec![
                s.project_name.clone(),
                s.month.clone(),
                or_dash(s.manual_total),
                or_dash(s.automated_total),
                or_dash(s.supported_releases_count),
                s.created_at.clone(),
            ]);
        }
        render_list("submission", &table, self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct SubmissionDetailOutput {
    pub submission: SubmissionOutput,
    pub summary: String,
}

impl CommandOutput for SubmissionDetailOutput {
    fn to_human(&self) -> String {
        format!(
            "Submission {}\nSaved: {}\n{}",
            self.submission.id, self.submission.created_at, self.summary
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct MonthListOutput {
    pub months: Vec<String>,
}

impl CommandOutput for MonthListOutput {
    fn to_human(&self) -> String {
        if self.months.is_empty() {
            return "No submissions found.".to_string();
        }
        self.months.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Resolve a project argument through the registry, accepting unknown ids as-is.
fn resolve_project(registry: &ProjectRegistry, raw: &str) -> Result<ProjectId> {
    let id = match registry.find_project(raw) {
        Some(project) => project.project_id()?,
        None => ProjectId::parse(raw)?,
    };
    Ok(id)
}

fn parse_month(raw: &str) -> Result<ReportingPeriod> {
    ReportingPeriod::parse_iso(raw).with_context(|| format!("Invalid month: {raw}"))
}

pub async fn execute(args: SubmissionsArgs, config: &Config, json_mode: bool) -> Result<()> {
    let service = submission_service(config).await?;
    let registry = &config.registry;

    match args.command {
        SubmissionsCommands::List { month, project } => {
            let period = parse_month(&month)?;
            let submissions = match project {
                Some(raw) => service.history(&resolve_project(registry, &raw)?, period).await?,
                None => service.list_by_period(period).await?,
            };
            let out = SubmissionListOutput {
                total: submissions.len(),
                submissions: submissions
                    .iter()
                    .map(|s| SubmissionOutput::new(s, registry))
                    .collect(),
            };
            output(&out, json_mode);
        }

        SubmissionsCommands::Latest { project, month } => {
            let project_id = resolve_project(registry, &project)?;
            let period = parse_month(&month)?;
            let submission = service
                .latest(&project_id, period)
                .await?
                .ok_or_else(|| anyhow::anyhow!("No submission for {project_id} in {period}"))?;

            let summary = crate::services::formatters::format_submission_summary(
                registry,
                &submission.project,
                submission.period,
                submission.metrics.coverage.as_ref(),
                submission.metrics.supported_releases_count,
            );
            let out = SubmissionDetailOutput {
                submission: SubmissionOutput::new(&submission, registry),
                summary,
            };
            output(&out, json_mode);
        }

        SubmissionsCommands::Months { limit } => {
            let months = service
                .recent_periods(limit)
                .await?
                .iter()
                .map(ReportingPeriod::to_iso_month)
                .collect();
            output(&MonthListOutput { months }, json_mode);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{default_portfolio, CoverageMetrics, SubmissionMetrics};

    #[test]
    fn test_resolve_project_by_name() {
        let registry = default_portfolio();
        assert_eq!(resolve_project(&registry, "Payments").unwrap().as_str(), "payments");
        assert_eq!(resolve_project(&registry, "retired-app").unwrap().as_str(), "retired-app");
        assert!(resolve_project(&registry, " ").is_err());
    }

    #[test]
    fn test_parse_month_context() {
        let err = parse_month("2026/01").unwrap_err();
        assert!(err.to_string().contains("Invalid month: 2026/01"));
    }

    #[test]
    fn test_submission_output_fields() {
        let metrics = SubmissionMetrics::new(
            Some(CoverageMetrics {
                manual_total: Some(30),
                automated_total: Some(10),
                ..Default::default()
            }),
            None,
            Some(4),
        )
        .unwrap();
        let submission = Submission::create(
            ProjectId::parse("kyc").unwrap(),
            ReportingPeriod::new(2026, 3).unwrap(),
            metrics,
            None,
        )
        .unwrap();

        let out = SubmissionOutput::new(&submission, &default_portfolio());
        assert_eq!(out.project_name, "KYC");
        assert_eq!(out.month, "2026-03");
        assert_eq!(out.automation_percentage, Some(25.0));
        assert_eq!(out.supported_releases_count, Some(4));
    }
}
