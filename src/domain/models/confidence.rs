//! Extraction confidence levels.

use serde::{Deserialize, Serialize};

/// Self-reported certainty of the extraction service about a project match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    /// Lenient parse for adapter-provided values: anything unrecognized is low.
    pub fn from_raw(s: &str) -> Self {
        Self::from_str(s).unwrap_or(Self::Low)
    }

    pub fn is_high(&self) -> bool {
        matches!(self, Self::High)
    }
}
