//! `qa-intake projects`: show the configured portfolio.

use anyhow::Result;
use clap::Args;

use crate::cli::output::{list_table, output, render_list, CommandOutput};
use crate::domain::models::{Config, ProjectRegistry};

#[derive(Args, Debug)]
pub struct ProjectsArgs {
    /// Only show projects in this business stream
    #[arg(short, long)]
    pub stream: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct ProjectRow {
    pub id: String,
    pub name: String,
    pub stream_id: String,
    pub stream_name: String,
}

#[derive(Debug, serde::Serialize)]
pub struct ProjectListOutput {
    pub projects: Vec<ProjectRow>,
    pub total: usize,
}

impl CommandOutput for ProjectListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["stream", "id", "name"]);
        for project in &self.projects {
            table.add_row(vec![&project.stream_name, &project.id, &project.name]);
        }
        render_list("project", &table, self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Projects grouped in stream display order.
pub fn project_rows(registry: &ProjectRegistry, stream: Option<&str>) -> Result<Vec<ProjectRow>> {
    if let Some(stream_id) = stream {
        registry.stream_name(stream_id)?;
    }

    let rows = registry
        .ordered_streams()
        .into_iter()
        .filter(|s| stream.is_none_or(|wanted| wanted == s.id))
        .flat_map(|s| {
            registry
                .projects_for_stream(&s.id)
                .into_iter()
                .map(move |p| ProjectRow {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    stream_id: s.id.clone(),
                    stream_name: s.name.clone(),
                })
        })
        .collect();
    Ok(rows)
}

pub fn execute(args: ProjectsArgs, config: &Config, json_mode: bool) -> Result<()> {
    let projects = project_rows(&config.registry, args.stream.as_deref())?;
    output(
        &ProjectListOutput {
            total: projects.len(),
            projects,
        },
        json_mode,
    );
    Ok(())
}
