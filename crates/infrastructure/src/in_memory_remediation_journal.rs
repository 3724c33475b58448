use std::collections::HashMap;

use async_trait::async_trait;
use connguard_application::RemediationJournal;
use connguard_core::AppResult;
use connguard_domain::ResourceId;
use tokio::sync::RwLock;

/// Process-local remediation journal.
///
/// Entries are lost on exit, so an interrupted run cannot resume from it.
#[derive(Debug, Default)]
pub struct InMemoryRemediationJournal {
    entries: RwLock<HashMap<String, Vec<String>>>,
}

impl InMemoryRemediationJournal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RemediationJournal for InMemoryRemediationJournal {
    async fn record_deleted(
        &self,
        resource_id: &ResourceId,
        connection_id: &str,
    ) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        let deleted = entries.entry(resource_id.as_str().to_owned()).or_default();
        if !deleted.iter().any(|stored| stored == connection_id) {
            deleted.push(connection_id.to_owned());
        }

        Ok(())
    }

    async fn deleted_connections(&self, resource_id: &ResourceId) -> AppResult<Vec<String>> {
        Ok(self
            .entries
            .read()
            .await
            .get(resource_id.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn clear(&self, resource_id: &ResourceId) -> AppResult<()> {
        self.entries.write().await.remove(resource_id.as_str());
        Ok(())
    }
}
