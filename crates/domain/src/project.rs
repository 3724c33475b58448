use serde::{Deserialize, Serialize};

/// One deployment environment of an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Environment name, e.g. `dev` or `prod`.
    #[serde(default)]
    pub name: String,
    /// Resource group that hosts the environment's resources.
    pub resource_group: String,
}

/// Application registered under a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// Application name.
    #[serde(default)]
    pub name: String,
    /// Environments of the application.
    #[serde(default)]
    pub environments: Vec<Environment>,
}

/// Project metadata resolved once per audit run.
///
/// Its application and environment tree is the search space for resource
/// existence checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectContext {
    /// Upper-cased project identifier.
    pub project_id: String,
    /// Subscription that hosts the project's resource groups.
    pub subscription_id: String,
    /// Connector types allowed for this project on top of the global list.
    #[serde(default, alias = "logic_apps_allowed_connectors")]
    pub allowed_connectors: Vec<String>,
    /// Applications registered under the project.
    #[serde(default)]
    pub applications: Vec<Application>,
}

impl ProjectContext {
    /// Returns every environment resource group, application by application.
    pub fn resource_groups(&self) -> impl Iterator<Item = &str> {
        self.applications.iter().flat_map(|application| {
            application
                .environments
                .iter()
                .map(|environment| environment.resource_group.as_str())
        })
    }
}
