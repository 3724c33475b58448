use std::collections::HashMap;
use std::sync::Arc;

use connguard_core::{AppError, AppResult};
use connguard_domain::{ProjectContext, ResourceKind};
use serde_json::Value;
use tracing::debug;

use crate::compliance_config::ComplianceConfig;
use crate::compliance_ports::ProviderClient;

/// Resource listings fetched during one audit run.
///
/// A cache must not outlive the run it was created for.
#[derive(Debug, Default)]
pub struct InventoryCache {
    listings: HashMap<(String, ResourceKind), Vec<Value>>,
}

impl InventoryCache {
    /// Creates an empty per-run cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Checks whether a connector's backing resource exists inside a project.
#[derive(Clone)]
pub struct ResourceExistenceVerifier {
    provider: Arc<dyn ProviderClient>,
    config: Arc<ComplianceConfig>,
}

impl ResourceExistenceVerifier {
    /// Creates a verifier.
    #[must_use]
    pub fn new(provider: Arc<dyn ProviderClient>, config: Arc<ComplianceConfig>) -> Self {
        Self { provider, config }
    }

    /// Returns true when a resource of `kind` named `candidate_name` exists in
    /// any environment of any application of the project.
    pub async fn exists(
        &self,
        project: &ProjectContext,
        kind: ResourceKind,
        candidate_name: &str,
    ) -> AppResult<bool> {
        self.exists_cached(project, kind, candidate_name, &mut InventoryCache::new())
            .await
    }

    /// Same as [`Self::exists`], reusing listings already fetched in this run.
    pub async fn exists_cached(
        &self,
        project: &ProjectContext,
        kind: ResourceKind,
        candidate_name: &str,
        cache: &mut InventoryCache,
    ) -> AppResult<bool> {
        for resource_group in project.resource_groups() {
            let key = (resource_group.to_owned(), kind);
            if !cache.listings.contains_key(&key) {
                let listing = self.list_resources(project, resource_group, kind).await?;
                cache.listings.insert(key.clone(), listing);
            }

            let found = cache
                .listings
                .get(&key)
                .is_some_and(|instances| {
                    instances
                        .iter()
                        .any(|instance| kind.matches(instance, candidate_name))
                });

            if found {
                debug!(
                    project_id = %project.project_id,
                    resource_group,
                    kind = %kind,
                    candidate_name,
                    "resource found"
                );
                return Ok(true);
            }
        }

        Ok(false)
    }

    async fn list_resources(
        &self,
        project: &ProjectContext,
        resource_group: &str,
        kind: ResourceKind,
    ) -> AppResult<Vec<Value>> {
        let url = self.config.resource_listing_url(
            project.subscription_id.as_str(),
            resource_group,
            kind,
        );
        let api_version = self.config.api_versions().for_kind(kind);

        let response = tokio::time::timeout(
            self.config.scan_timeout(),
            self.provider.get_json(url.as_str(), api_version),
        )
        .await
        .map_err(|_| {
            AppError::InventoryScan(format!(
                "listing {kind} in resource group '{resource_group}' timed out after {}s",
                self.config.scan_timeout().as_secs()
            ))
        })?
        .map_err(|error| {
            AppError::InventoryScan(format!(
                "failed to list {kind} in resource group '{resource_group}': {error}"
            ))
        })?;

        match response {
            Value::Object(mut body) => match body.remove("value") {
                Some(Value::Array(instances)) => Ok(instances),
                _ => Err(AppError::InventoryScan(format!(
                    "listing {kind} in resource group '{resource_group}' returned no value array"
                ))),
            },
            _ => Err(AppError::InventoryScan(format!(
                "listing {kind} in resource group '{resource_group}' returned a non-object body"
            ))),
        }
    }
}
