//! Registry of business streams and the projects that report into them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::project::{BusinessStream, Project};
use crate::domain::errors::{DomainError, DomainResult};

/// Known portfolio of streams and projects.
///
/// Used by the dialogue engine as the fallback lookup when extraction fails,
/// and handed to the extraction service so it can match against known names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRegistry {
    #[serde(default)]
    pub streams: Vec<BusinessStream>,
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl ProjectRegistry {
    /// Build a registry, rejecting duplicate ids and dangling stream references.
    pub fn new(streams: Vec<BusinessStream>, projects: Vec<Project>) -> DomainResult<Self> {
        let registry = Self { streams, projects };
        registry.validate()?;
        Ok(registry)
    }

    pub fn validate(&self) -> DomainResult<()> {
        let mut stream_ids = HashSet::new();
        for stream in &self.streams {
            stream.validate()?;
            if !stream_ids.insert(stream.id.as_str()) {
                return Err(DomainError::InvalidConfiguration(
                    "Business stream IDs must be unique".to_string(),
                ));
            }
        }

        let mut project_ids = HashSet::new();
        for project in &self.projects {
            project.validate()?;
            if !project_ids.insert(project.id.as_str()) {
                return Err(DomainError::InvalidConfiguration(
                    "Project IDs must be unique".to_string(),
                ));
            }
            if !stream_ids.contains(project.business_stream_id.as_str()) {
                return Err(DomainError::InvalidConfiguration(format!(
                    "Project {} references unknown stream {}",
                    project.id, project.business_stream_id
                )));
            }
        }

        Ok(())
    }

    /// Find a project by id or display name, ignoring case and surrounding whitespace.
    pub fn find_project(&self, raw: &str) -> Option<&Project> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        self.projects.iter().find(|project| {
            project.id.to_lowercase() == normalized || project.name.to_lowercase() == normalized
        })
    }

    /// Display name for a project id, falling back to the id itself.
    pub fn display_name<'a>(&'a self, project_id: &'a str) -> &'a str {
        self.find_project(project_id)
            .map_or(project_id, |project| project.name.as_str())
    }

    pub fn projects_for_stream(&self, stream_id: &str) -> Vec<&Project> {
        self.projects
            .iter()
            .filter(|project| project.business_stream_id == stream_id)
            .collect()
    }

    pub fn stream_name(&self, stream_id: &str) -> DomainResult<&str> {
        self.streams
            .iter()
            .find(|stream| stream.id == stream_id)
            .map(|stream| stream.name.as_str())
            .ok_or_else(|| {
                DomainError::InvalidConfiguration(format!("Unknown stream id {stream_id}"))
            })
    }

    /// Streams in display order.
    pub fn ordered_streams(&self) -> Vec<&BusinessStream> {
        let mut streams: Vec<&BusinessStream> = self.streams.iter().collect();
        streams.sort_by_key(|stream| stream.order);
        streams
    }
}

impl Default for ProjectRegistry {
    fn default() -> Self {
        default_portfolio()
    }
}

/// The built-in portfolio used when no registry is configured.
pub fn default_portfolio() -> ProjectRegistry {
    let streams = vec![
        BusinessStream::new("affiliates", "Affiliates", 1),
        BusinessStream::new("backbone_bridge", "Backbone Systems / Bridge", 2),
        BusinessStream::new("backbone_platform", "Backbone Systems / Platform Systems", 3),
        BusinessStream::new("backbone_trading", "Backbone Systems / Trading Platform", 4),
        BusinessStream::new("client_engagement", "Client Engagement", 5),
        BusinessStream::new("client_journey", "Client Journey", 6),
        BusinessStream::new("funding", "Funding", 7),
        BusinessStream::new("internal_systems", "Internal Systems", 8),
        BusinessStream::new("mobile", "Mobile", 9),
        BusinessStream::new("www_cfa", "WWW / Client Face Application (CFA)", 10),
    ];

    let projects = vec![
        Project::new("affiliate", "Affiliate", "affiliates"),
        Project::new("bridge", "Bridge", "backbone_bridge"),
        Project::new("jthales", "JThales", "backbone_platform"),
        Project::new("jmanager_server_portal", "jManager Server and Portal", "backbone_platform"),
        Project::new("symbols_management_service", "Symbols Management Service", "backbone_platform"),
        Project::new("fees_management_service", "Fees Management Service", "backbone_platform"),
        Project::new("jtools", "JTools", "backbone_platform"),
        Project::new("data_access_layer", "Data Access Layer (DAL)", "backbone_platform"),
        Project::new("metaproxy", "MetaProxy", "backbone_trading"),
        Project::new("plugins", "Plugins", "backbone_trading"),
        Project::new("social_trading_copy", "Social Trading - Copy Trading", "client_engagement"),
        Project::new("promotions_tool", "Promotions Tool", "client_engagement"),
        Project::new("market_intelligence", "Market Intelligence", "client_engagement"),
        Project::new("client_support", "Client Support", "client_journey"),
        Project::new("client_authentication", "Client Authentication", "client_journey"),
        Project::new("onboarding_account_mgmt", "Onboarding & Account Management", "client_journey"),
        Project::new("payments", "Payments", "funding"),
        Project::new("withdrawals", "Withdrawals", "funding"),
        Project::new("kyc", "KYC", "internal_systems"),
        Project::new("crm", "CRM", "internal_systems"),
        Project::new("mobile_trading_point", "Mobile - Trading Point", "mobile"),
        Project::new("angular_www", "Angular WWW", "www_cfa"),
    ];

    ProjectRegistry { streams, projects }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_portfolio_is_valid() {
        let registry = default_portfolio();
        assert!(registry.validate().is_ok());
        assert!(!registry.projects.is_empty());
    }

    #[test]
    fn test_find_project_by_id_or_name() {
        let registry = default_portfolio();
        assert_eq!(registry.find_project("bridge").unwrap().id, "bridge");
        assert_eq!(registry.find_project("  Payments ").unwrap().id, "payments");
        assert_eq!(
            registry.find_project("data access layer (dal)").unwrap().id,
            "data_access_layer"
        );
        assert!(registry.find_project("unknown project").is_none());
        assert!(registry.find_project("   ").is_none());
    }

    #[test]
    fn test_duplicate_project_ids_rejected() {
        let result = ProjectRegistry::new(
            vec![BusinessStream::new("s", "Stream", 1)],
            vec![Project::new("p", "One", "s"), Project::new("p", "Two", "s")],
        );
        assert!(matches!(result, Err(DomainError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_unknown_stream_reference_rejected() {
        let result = ProjectRegistry::new(
            vec![BusinessStream::new("s", "Stream", 1)],
            vec![Project::new("p", "One", "missing")],
        );
        let err = result.unwrap_err();
        assert!(err.to_string().contains("unknown stream missing"));
    }

    #[test]
    fn test_stream_queries() {
        let registry = default_portfolio();
        assert_eq!(registry.stream_name("funding").unwrap(), "Funding");
        assert!(registry.stream_name("nope").is_err());
        let funding: Vec<&str> = registry
            .projects_for_stream("funding")
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(funding, vec!["payments", "withdrawals"]);
        assert_eq!(registry.ordered_streams()[0].id, "affiliates");
        assert_eq!(registry.display_name("kyc"), "KYC");
        assert_eq!(registry.display_name("ghost"), "ghost");
    }
}
