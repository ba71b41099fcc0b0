//! Wire types for the extraction service.

use serde::{Deserialize, Serialize};

use crate::domain::models::CoverageMetrics;

#[derive(Debug, Serialize)]
pub struct ProjectRequest<'a> {
    pub text: &'a str,
    pub projects: Vec<ProjectRef<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ProjectRef<'a> {
    pub id: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ProjectResponse {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub confidence: String,
}

#[derive(Debug, Serialize)]
pub struct PeriodRequest<'a> {
    pub text: &'a str,
    /// `YYYY-MM-DD`
    pub today: String,
}

#[derive(Debug, Deserialize)]
pub struct PeriodResponse {
    #[serde(default)]
    pub month: String,
}

#[derive(Debug, Serialize)]
pub struct CoverageRequest<'a> {
    pub text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct CoverageResponse {
    #[serde(default)]
    pub manual_total: Option<u32>,
    #[serde(default)]
    pub automated_total: Option<u32>,
    #[serde(default)]
    pub manual_created_in_period: Option<u32>,
    #[serde(default)]
    pub manual_updated_in_period: Option<u32>,
    #[serde(default)]
    pub automated_created_in_period: Option<u32>,
    #[serde(default)]
    pub automated_updated_in_period: Option<u32>,
    #[serde(default)]
    pub percentage_automation: Option<f64>,
    #[serde(default)]
    pub supported_releases_count: Option<u32>,
}

impl CoverageResponse {
    pub fn coverage(&self) -> CoverageMetrics {
        CoverageMetrics {
            manual_total: self.manual_total,
            automated_total: self.automated_total,
            manual_created_in_period: self.manual_created_in_period,
            manual_updated_in_period: self.manual_updated_in_period,
            automated_created_in_period: self.automated_created_in_period,
            automated_updated_in_period: self.automated_updated_in_period,
            percentage_automation: self.percentage_automation,
        }
    }
}
