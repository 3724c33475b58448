use async_trait::async_trait;
use connguard_core::AppResult;
use connguard_domain::{ResourceId, WorkflowResource};

/// Port for reading and rewriting deployed workflow definitions.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Reads the current workflow definition.
    async fn get_workflow(&self, resource_id: &ResourceId) -> AppResult<WorkflowResource>;

    /// Replaces the workflow definition.
    async fn put_workflow(
        &self,
        resource_id: &ResourceId,
        workflow: &WorkflowResource,
    ) -> AppResult<()>;
}
