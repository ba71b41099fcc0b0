//! Project identity and portfolio entities.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::{DomainError, DomainResult};

/// Validated project identifier.
///
/// Always trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectId(String);

impl ProjectId {
    /// Create a project identifier from raw input.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(DomainError::InvalidProjectId(
                "Project ID must not be empty".to_string(),
            ));
        }
        Ok(Self(normalized.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ProjectId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProjectId> for String {
    fn from(id: ProjectId) -> Self {
        id.0
    }
}

/// A business stream grouping projects in the portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessStream {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub order: u32,
}

impl BusinessStream {
    pub fn new(id: impl Into<String>, name: impl Into<String>, order: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            order,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.id.trim().is_empty() || self.name.trim().is_empty() {
            return Err(DomainError::InvalidConfiguration(
                "Business stream id and name must be provided".to_string(),
            ));
        }
        Ok(())
    }
}

/// A project that reports QA coverage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub business_stream_id: String,
}

impl Project {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        business_stream_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            business_stream_id: business_stream_id.into(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.id.trim().is_empty()
            || self.name.trim().is_empty()
            || self.business_stream_id.trim().is_empty()
        {
            return Err(DomainError::InvalidConfiguration(
                "Project id, name, and business stream id are required".to_string(),
            ));
        }
        Ok(())
    }

    /// The validated identifier for this project.
    pub fn project_id(&self) -> DomainResult<ProjectId> {
        ProjectId::parse(&self.id)
    }
}
