use async_trait::async_trait;
use connguard_core::AppResult;
use connguard_domain::ResourceId;

/// Durable record of connector deletes made by an unfinished remediation.
///
/// Entries survive until the workflow rewrite succeeds, so a re-run does not
/// delete the same connection twice.
#[async_trait]
pub trait RemediationJournal: Send + Sync {
    /// Records that a connection was deleted for the workflow.
    async fn record_deleted(&self, resource_id: &ResourceId, connection_id: &str)
    -> AppResult<()>;

    /// Returns connections deleted by earlier unfinished runs.
    async fn deleted_connections(&self, resource_id: &ResourceId) -> AppResult<Vec<String>>;

    /// Drops the journal of a workflow after its rewrite was persisted.
    async fn clear(&self, resource_id: &ResourceId) -> AppResult<()>;
}
