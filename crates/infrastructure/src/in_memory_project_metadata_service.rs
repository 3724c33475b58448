use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use connguard_application::ProjectMetadataService;
use connguard_core::{AppError, AppResult};
use connguard_domain::ProjectContext;
use tokio::sync::RwLock;

/// In-memory project metadata service, keyed by upper-cased project id.
#[derive(Debug, Default)]
pub struct InMemoryProjectMetadataService {
    projects: RwLock<HashMap<String, ProjectContext>>,
}

impl InMemoryProjectMetadataService {
    /// Creates a service that knows the given projects.
    #[must_use]
    pub fn new(projects: impl IntoIterator<Item = ProjectContext>) -> Self {
        Self {
            projects: RwLock::new(
                projects
                    .into_iter()
                    .map(|project| (project.project_id.to_uppercase(), project))
                    .collect(),
            ),
        }
    }

    /// Loads a JSON array of projects from disk.
    pub async fn from_json_file(path: &Path) -> AppResult<Self> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|error| {
            AppError::Configuration(format!(
                "failed to read project file '{}': {error}",
                path.display()
            ))
        })?;
        let projects: Vec<ProjectContext> = serde_json::from_str(&contents).map_err(|error| {
            AppError::Configuration(format!(
                "failed to parse project file '{}': {error}",
                path.display()
            ))
        })?;

        Ok(Self::new(projects))
    }
}

#[async_trait]
impl ProjectMetadataService for InMemoryProjectMetadataService {
    async fn get_project_info(&self, project_id: &str) -> AppResult<ProjectContext> {
        self.projects
            .read()
            .await
            .get(project_id.to_uppercase().as_str())
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("project '{project_id}' does not exist")))
    }
}
