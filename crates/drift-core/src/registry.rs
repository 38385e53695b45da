//! Environment/service registry and URL building rules.
//!
//! The registry enumerates the deployment environments and the services
//! probed in each of them. It is validated at construction so the rest
//! of the system can rely on the total-coverage invariant: every
//! (environment, service) pair exists exactly once.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Service name that gets the frontend payload/URL special case.
pub const FRONTEND_SERVICE: &str = "frontend";

/// One deployment environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentDescriptor {
    /// Unique display title, e.g. `"Production"`.
    pub title: String,
    /// Base URL of the admin API in this environment.
    pub base_url: String,
    /// Base URL of the frontend deployment, which is served from a
    /// different host than the admin API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontend_url: Option<String>,
}

/// One probed service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Unique registry key, e.g. `"bulk-upload"`.
    pub name: String,
    pub display_name: String,
    /// Endpoint path (may carry a query string), appended to the
    /// environment base URL.
    pub endpoint: String,
    /// Top-level payload field holding the version object(s),
    /// e.g. `"version"` or `"git"`.
    pub version_path: String,
}

impl ServiceDescriptor {
    /// Whether this endpoint is an idempotent health check. Only these
    /// requests are eligible for retry.
    pub fn is_health_check(&self) -> bool {
        self.endpoint.contains("healthcheck") || self.endpoint.contains("monitoring-service")
    }
}

/// Static registry of environments and services, loaded at startup.
#[derive(Debug, Clone)]
pub struct Registry {
    environments: Vec<EnvironmentDescriptor>,
    services: Vec<ServiceDescriptor>,
    default_baseline: String,
}

impl Registry {
    /// Build a validated registry.
    ///
    /// Rejects empty environment/service lists, duplicate titles or
    /// names, and a default baseline naming no configured environment.
    /// When no baseline is given, the first environment is the default.
    pub fn new(
        environments: Vec<EnvironmentDescriptor>,
        services: Vec<ServiceDescriptor>,
        default_baseline: Option<String>,
    ) -> CoreResult<Self> {
        if environments.is_empty() {
            return Err(CoreError::InvalidRegistry(
                "at least one environment is required".to_string(),
            ));
        }
        if services.is_empty() {
            return Err(CoreError::InvalidRegistry(
                "at least one service is required".to_string(),
            ));
        }
        for (i, env) in environments.iter().enumerate() {
            if environments[..i].iter().any(|e| e.title == env.title) {
                return Err(CoreError::InvalidRegistry(format!(
                    "duplicate environment title: {}",
                    env.title
                )));
            }
        }
        for (i, svc) in services.iter().enumerate() {
            if services[..i].iter().any(|s| s.name == svc.name) {
                return Err(CoreError::InvalidRegistry(format!(
                    "duplicate service name: {}",
                    svc.name
                )));
            }
        }

        let default_baseline = match default_baseline {
            Some(title) => {
                if !environments.iter().any(|e| e.title == title) {
                    return Err(CoreError::UnknownEnvironment(title));
                }
                title
            }
            None => environments[0].title.clone(),
        };

        Ok(Self {
            environments,
            services,
            default_baseline,
        })
    }

    pub fn environments(&self) -> &[EnvironmentDescriptor] {
        &self.environments
    }

    pub fn services(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    /// The configured default baseline environment title.
    pub fn default_baseline(&self) -> &str {
        &self.default_baseline
    }

    pub fn environment(&self, title: &str) -> Option<&EnvironmentDescriptor> {
        self.environments.iter().find(|e| e.title == title)
    }

    pub fn service(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.services.iter().find(|s| s.name == name)
    }

    /// Number of (environment, service) cells in the matrix.
    pub fn cell_count(&self) -> usize {
        self.environments.len() * self.services.len()
    }

    /// Build the target URL for one (environment, service) pair.
    ///
    /// The frontend service is served from the environment's frontend
    /// host rather than the admin API host; everything else appends the
    /// endpoint path to the admin API base URL.
    pub fn build_url(&self, env: &EnvironmentDescriptor, service: &ServiceDescriptor) -> String {
        let base = if service.name == FRONTEND_SERVICE {
            env.frontend_url.as_deref().unwrap_or(&env.base_url)
        } else {
            &env.base_url
        };
        format!("{}{}", base.trim_end_matches('/'), service.endpoint)
    }
}
