//! Extraction service HTTP client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use chrono::NaiveDate;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client as ReqwestClient;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::num::NonZeroU32;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

use super::errors::ExtractionClientError;
use super::types::{
    CoverageRequest, CoverageResponse, PeriodRequest, PeriodResponse, ProjectRef, ProjectRequest,
    ProjectResponse,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Confidence, ExtractionConfig, ProjectRegistry, ReportingPeriod};
use crate::domain::ports::{CoverageExtraction, ExtractionPort, ProjectMatch};

const PROJECT_PATH: &str = "/v1/extract/project";
const PERIOD_PATH: &str = "/v1/extract/period";
const COVERAGE_PATH: &str = "/v1/extract/coverage";

/// Configuration for the extraction client
#[derive(Debug, Clone)]
pub struct ExtractionClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Retries after the first attempt, transient failures only
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Outbound request throttle, retries included
    pub requests_per_second: u32,
}

impl From<&ExtractionConfig> for ExtractionClientConfig {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
            initial_backoff_ms: config.initial_backoff_ms,
            max_backoff_ms: config.max_backoff_ms,
            requests_per_second: config.requests_per_second,
        }
    }
}

/// `ExtractionPort` backed by a JSON-over-HTTP extraction service.
///
/// Transient failures (429, 5xx, network) are retried with exponential
/// backoff; everything else fails immediately. All failures surface as
/// `DomainError::ExtractionFailed` or `DomainError::AmbiguousExtraction`.
///
/// Every attempt first waits on a token-bucket throttle of
/// `requests_per_second`, shared across sessions.
pub struct HttpExtractionClient {
    http_client: ReqwestClient,
    throttle: DefaultDirectRateLimiter,
    config: ExtractionClientConfig,
}

impl HttpExtractionClient {
    pub fn new(config: ExtractionClientConfig) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(4)
            .build()
            .context("Failed to build HTTP client")?;
        let rate = NonZeroU32::new(config.requests_per_second)
            .context("Extraction requests_per_second must be at least 1")?;

        Ok(Self {
            http_client,
            throttle: RateLimiter::direct(Quota::per_second(rate)),
            config,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    async fn send_once<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, ExtractionClientError>
    where
        Req: Serialize + Sync + ?Sized,
        Resp: DeserializeOwned,
    {
        self.throttle.until_ready().await;

        let mut request = self.http_client.post(self.url(path)).json(body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(ExtractionClientError::from_status(status, body));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ExtractionClientError::InvalidResponse(e.to_string()))
    }

    async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, ExtractionClientError>
    where
        Req: Serialize + Sync + ?Sized,
        Resp: DeserializeOwned,
    {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(self.config.initial_backoff_ms))
            .with_max_interval(Duration::from_millis(self.config.max_backoff_ms))
            .with_max_elapsed_time(None)
            .build();

        let max_retries = self.config.max_retries;
        let started = Instant::now();
        let mut attempts = 0u32;

        let result = backoff::future::retry(policy, || {
            attempts += 1;
            let attempt = attempts;
            async move {
                match self.send_once(path, body).await {
                    Ok(response) => Ok(response),
                    Err(err) if err.is_transient() && attempt <= max_retries => {
                        warn!(path, attempt, error = %err, "transient extraction failure, retrying");
                        Err(backoff::Error::transient(err))
                    }
                    Err(err) => Err(backoff::Error::permanent(err)),
                }
            }
        })
        .await;

        debug!(
            path,
            attempts,
            latency_ms = started.elapsed().as_millis() as u64,
            success = result.is_ok(),
            "extraction request finished"
        );
        result
    }
}

/// Turn the service's month value into a reporting period.
fn resolve_month(value: &str, today: NaiveDate) -> DomainResult<ReportingPeriod> {
    let cleaned = value.trim().to_lowercase();
    match cleaned.as_str() {
        "" => Err(DomainError::AmbiguousExtraction("reporting month".to_string())),
        "current" | "current_month" => ReportingPeriod::from_date(today),
        "previous" | "previous_month" | "last" => ReportingPeriod::previous_for(today),
        _ => ReportingPeriod::parse_iso(&cleaned),
    }
}

#[async_trait]
impl ExtractionPort for HttpExtractionClient {
    #[instrument(skip(self, text, registry))]
    async fn extract_project(
        &self,
        text: &str,
        registry: &ProjectRegistry,
    ) -> DomainResult<ProjectMatch> {
        let request = ProjectRequest {
            text,
            projects: registry
                .projects
                .iter()
                .map(|p| ProjectRef {
                    id: &p.id,
                    name: &p.name,
                })
                .collect(),
        };
        let response: ProjectResponse = self.post_json(PROJECT_PATH, &request).await?;

        let project = registry
            .find_project(&response.project_id)
            .ok_or_else(|| DomainError::AmbiguousExtraction("project identifier".to_string()))?;

        Ok(ProjectMatch {
            project_id: project.project_id()?,
            confidence: Confidence::from_raw(&response.confidence),
        })
    }

    #[instrument(skip(self, text))]
    async fn extract_period(&self, text: &str, today: NaiveDate) -> DomainResult<ReportingPeriod> {
        let request = PeriodRequest {
            text,
            today: today.format("%Y-%m-%d").to_string(),
        };
        let response: PeriodResponse = self.post_json(PERIOD_PATH, &request).await?;
        resolve_month(&response.month, today)
    }

    #[instrument(skip(self, text))]
    async fn extract_coverage(&self, text: &str) -> DomainResult<CoverageExtraction> {
        let response: CoverageResponse = self.post_json(COVERAGE_PATH, &CoverageRequest { text }).await?;

        let coverage = response.coverage();
        if coverage.is_empty() && response.supported_releases_count.is_none() {
            return Err(DomainError::AmbiguousExtraction("test coverage".to_string()));
        }
        coverage.validate()?;

        Ok(CoverageExtraction {
            coverage,
            supported_releases_count: response.supported_releases_count,
        })
    }
}
