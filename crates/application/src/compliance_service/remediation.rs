use connguard_core::{AppError, AppResult};
use connguard_domain::{RemediationReport, ResourceId};
use tracing::{info, warn};

use crate::compliance_ports::DeleteOutcome;

use super::ComplianceService;

impl ComplianceService {
    /// Deletes invalid connections and removes their aliases from the workflow.
    ///
    /// Deletes run first, then the workflow is rewritten once. A failed delete
    /// aborts before the rewrite. With a journal attached, deletes of an
    /// interrupted run are not repeated on the next call, and their aliases are
    /// removed even when `invalid_connection_ids` no longer lists them.
    pub async fn remediate(
        &self,
        resource_id: &str,
        invalid_connection_ids: &[String],
    ) -> AppResult<RemediationReport> {
        let resource_id = ResourceId::parse(resource_id)?;
        let mut workflow = self
            .workflow_store
            .get_workflow(&resource_id)
            .await
            .map_err(|error| {
                AppError::Remediation(format!("failed to read workflow '{resource_id}': {error}"))
            })?;
        let snapshot = workflow.connector_bindings()?;
        let journaled = self.journaled_deletes(&resource_id).await?;

        // Journaled deletes stay targets even when no longer reported as invalid.
        let mut targets = invalid_connection_ids.to_vec();
        for connection_id in &journaled {
            if !targets.contains(connection_id) {
                targets.push(connection_id.clone());
            }
        }

        let mut report = RemediationReport::default();
        for connection_id in &targets {
            if journaled.contains(connection_id) {
                report.already_absent.push(connection_id.clone());
            } else {
                match self.delete_connection(connection_id).await? {
                    DeleteOutcome::Deleted => report.deleted.push(connection_id.clone()),
                    DeleteOutcome::NotFound => report.already_absent.push(connection_id.clone()),
                }
                if let Some(journal) = &self.remediation_journal {
                    journal
                        .record_deleted(&resource_id, connection_id)
                        .await
                        .map_err(|error| {
                            AppError::Remediation(format!(
                                "failed to journal delete of '{connection_id}': {error}"
                            ))
                        })?;
                }
            }

            for binding in snapshot
                .iter()
                .filter(|binding| &binding.connection_id == connection_id)
            {
                if workflow.remove_binding(binding.alias.as_str()) {
                    report.removed_aliases.push(binding.alias.clone());
                }
            }
        }

        if !report.removed_aliases.is_empty() {
            self.workflow_store
                .put_workflow(&resource_id, &workflow)
                .await
                .map_err(|error| {
                    AppError::Remediation(format!(
                        "failed to update workflow '{resource_id}': {error}"
                    ))
                })?;
            report.workflow_updated = true;
        }

        if let Some(journal) = &self.remediation_journal {
            journal.clear(&resource_id).await.map_err(|error| {
                AppError::Remediation(format!(
                    "failed to clear remediation journal of '{resource_id}': {error}"
                ))
            })?;
        }

        info!(
            resource_id = %resource_id,
            deleted = report.deleted.len(),
            already_absent = report.already_absent.len(),
            removed_aliases = report.removed_aliases.len(),
            workflow_updated = report.workflow_updated,
            "remediation completed"
        );

        Ok(report)
    }

    async fn journaled_deletes(&self, resource_id: &ResourceId) -> AppResult<Vec<String>> {
        let Some(journal) = &self.remediation_journal else {
            return Ok(Vec::new());
        };

        let journaled = journal
            .deleted_connections(resource_id)
            .await
            .map_err(|error| {
                AppError::Remediation(format!(
                    "failed to read remediation journal of '{resource_id}': {error}"
                ))
            })?;
        if !journaled.is_empty() {
            warn!(
                resource_id = %resource_id,
                journaled = journaled.len(),
                "resuming interrupted remediation"
            );
        }

        Ok(journaled)
    }

    async fn delete_connection(&self, connection_id: &str) -> AppResult<DeleteOutcome> {
        let url = self.config.management_url(connection_id);
        self.provider
            .delete(url.as_str(), self.config.api_versions().logic_apps.as_str())
            .await
            .map_err(|error| {
                AppError::Remediation(format!(
                    "failed to delete connection '{connection_id}': {error}"
                ))
            })
    }
}
