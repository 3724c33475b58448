use async_trait::async_trait;
use connguard_core::AppResult;
use connguard_domain::ProjectContext;

/// Port for the project metadata service.
#[async_trait]
pub trait ProjectMetadataService: Send + Sync {
    /// Returns subscription, allow-list and application tree of one project.
    async fn get_project_info(&self, project_id: &str) -> AppResult<ProjectContext>;
}
