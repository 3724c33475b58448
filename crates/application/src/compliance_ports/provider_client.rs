use async_trait::async_trait;
use connguard_core::AppResult;
use serde_json::Value;

/// Result of deleting a provider resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The resource existed and was deleted.
    Deleted,
    /// The resource was already gone.
    NotFound,
}

/// Port for the cloud provider's management REST endpoint.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Reads one JSON document from a fully-qualified management URL.
    async fn get_json(&self, url: &str, api_version: &str) -> AppResult<Value>;

    /// Deletes the resource at a fully-qualified management URL.
    async fn delete(&self, url: &str, api_version: &str) -> AppResult<DeleteOutcome>;
}
