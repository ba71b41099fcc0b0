//! Coverage metrics and the submission metrics payload.
//!
//! Every metric is an `Option`: `None` means "not reported in this update",
//! while `Some(0)` is a reported zero. Merging relies on that distinction.

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

/// Test coverage numbers for a project and period.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CoverageMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_total: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automated_total: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_created_in_period: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_updated_in_period: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automated_created_in_period: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automated_updated_in_period: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage_automation: Option<f64>,
}

impl CoverageMetrics {
    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.manual_total.is_none()
            && self.automated_total.is_none()
            && self.manual_created_in_period.is_none()
            && self.manual_updated_in_period.is_none()
            && self.automated_created_in_period.is_none()
            && self.automated_updated_in_period.is_none()
            && self.percentage_automation.is_none()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let Some(percentage) = self.percentage_automation {
            if !percentage.is_finite() || !(0.0..=100.0).contains(&percentage) {
                return Err(DomainError::InvalidMetricInput(
                    "Percentage automation must be between 0 and 100".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Field-wise merge: a value present here wins, an absent one takes `existing`'s.
    pub fn merge_with(&self, existing: &Self) -> Self {
        Self {
            manual_total: self.manual_total.or(existing.manual_total),
            automated_total: self.automated_total.or(existing.automated_total),
            manual_created_in_period: self
                .manual_created_in_period
                .or(existing.manual_created_in_period),
            manual_updated_in_period: self
                .manual_updated_in_period
                .or(existing.manual_updated_in_period),
            automated_created_in_period: self
                .automated_created_in_period
                .or(existing.automated_created_in_period),
            automated_updated_in_period: self
                .automated_updated_in_period
                .or(existing.automated_updated_in_period),
            percentage_automation: self.percentage_automation.or(existing.percentage_automation),
        }
    }

    /// Reported automation share, or one derived from the totals.
    pub fn automation_percentage(&self) -> Option<f64> {
        if self.percentage_automation.is_some() {
            return self.percentage_automation;
        }
        let manual = f64::from(self.manual_total?);
        let automated = f64::from(self.automated_total?);
        let total = manual + automated;
        if total == 0.0 {
            return None;
        }
        Some((automated / total * 10_000.0).round() / 100.0)
    }
}

/// Validated metrics payload of a submission.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubmissionMetrics {
    pub coverage: Option<CoverageMetrics>,
    pub overall_test_cases: Option<u32>,
    pub supported_releases_count: Option<u32>,
}

impl SubmissionMetrics {
    /// Build a payload, rejecting one that carries no data at all.
    ///
    /// An all-empty coverage block is normalized to `None`.
    pub fn new(
        coverage: Option<CoverageMetrics>,
        overall_test_cases: Option<u32>,
        supported_releases_count: Option<u32>,
    ) -> DomainResult<Self> {
        let metrics = Self {
            coverage: coverage.filter(|c| !c.is_empty()),
            overall_test_cases,
            supported_releases_count,
        };
        metrics.validate()?;
        Ok(metrics)
    }

    pub fn has_data(&self) -> bool {
        self.coverage.is_some_and(|c| !c.is_empty())
            || self.overall_test_cases.is_some()
            || self.supported_releases_count.is_some()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let Some(coverage) = &self.coverage {
            coverage.validate()?;
        }
        if !self.has_data() {
            return Err(DomainError::MissingSubmissionData(
                "Submission must include test coverage, overall test cases, or supported releases count"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Null-coalescing merge against the latest stored payload.
    ///
    /// Top-level fields take the incoming value when present; coverage is
    /// merged one level deeper, field by field. Both payloads are validated
    /// first so an empty update can never be persisted.
    pub fn merge_with(&self, existing: Option<&Self>) -> DomainResult<Self> {
        self.validate()?;
        let Some(existing) = existing else {
            return Ok(self.clone());
        };
        existing.validate()?;

        let coverage = match (&self.coverage, &existing.coverage) {
            (Some(incoming), Some(previous)) => Some(incoming.merge_with(previous)),
            (Some(incoming), None) => Some(*incoming),
            (None, previous) => *previous,
        };

        Ok(Self {
            coverage,
            overall_test_cases: self.overall_test_cases.or(existing.overall_test_cases),
            supported_releases_count: self
                .supported_releases_count
                .or(existing.supported_releases_count),
        })
    }
}
