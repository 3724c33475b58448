use std::sync::Arc;

use connguard_core::{AppError, AppResult};
use connguard_domain::{
    AllowList, GLOBAL_ALLOW_LIST_PARTITION_KEY, GLOBAL_ALLOW_LIST_ROW_KEY, ProjectContext,
    ResourceId, split_global_allow_list,
};
use tracing::debug;

use crate::compliance_ports::{LookupStore, ProjectMetadataService};

/// Resolves the connector allow-list that applies to one workflow.
#[derive(Clone)]
pub struct AllowListResolver {
    lookup_store: Arc<dyn LookupStore>,
    project_metadata: Arc<dyn ProjectMetadataService>,
    lookup_table_name: String,
}

impl AllowListResolver {
    /// Creates an allow-list resolver.
    #[must_use]
    pub fn new(
        lookup_store: Arc<dyn LookupStore>,
        project_metadata: Arc<dyn ProjectMetadataService>,
        lookup_table_name: impl Into<String>,
    ) -> Self {
        Self {
            lookup_store,
            project_metadata,
            lookup_table_name: lookup_table_name.into(),
        }
    }

    /// Resolves the merged allow-list for the project owning `resource_id`.
    pub async fn resolve(&self, resource_id: &ResourceId) -> AppResult<AllowList> {
        let project_id = resource_id.project_id();
        let project = self
            .project_metadata
            .get_project_info(project_id.as_str())
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to resolve allowed connectors for project '{project_id}': {error}"
                ))
            })?;

        self.resolve_for_project(&project).await
    }

    /// Resolves the merged allow-list for an already fetched project.
    pub async fn resolve_for_project(&self, project: &ProjectContext) -> AppResult<AllowList> {
        let entities = self
            .lookup_store
            .query_entities(self.lookup_table_name.as_str())
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to read global allowed connectors from '{}': {error}",
                    self.lookup_table_name
                ))
            })?;

        let global = entities
            .into_iter()
            .find(|entity| {
                entity.partition_key == GLOBAL_ALLOW_LIST_PARTITION_KEY
                    && entity.row_key == GLOBAL_ALLOW_LIST_ROW_KEY
            })
            .and_then(|entity| entity.values)
            .map(|values| split_global_allow_list(values.as_str()))
            .unwrap_or_default();

        let allow_list = AllowList::merge(&global, &project.allowed_connectors)?;
        debug!(
            project_id = %project.project_id,
            allowed = allow_list.entries().len(),
            "resolved allowed connectors"
        );

        Ok(allow_list)
    }
}
