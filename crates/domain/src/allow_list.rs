use std::collections::HashSet;

use connguard_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::connection::ConnectorTypeIdentifier;

/// Partition key of the lookup record holding the global allow-list.
pub const GLOBAL_ALLOW_LIST_PARTITION_KEY: &str = "Lookup";

/// Row key of the lookup record holding the global allow-list.
pub const GLOBAL_ALLOW_LIST_ROW_KEY: &str = "allowed_connectors";

/// Ordered set of connector types permitted by policy.
///
/// Global entries always precede project-only entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowList {
    entries: Vec<ConnectorTypeIdentifier>,
}

impl AllowList {
    /// Merges the global and project lists as `global ∪ (project \ global)`.
    ///
    /// Fails with a configuration error when the merged list is empty.
    pub fn merge<G, P>(global: G, project: P) -> AppResult<Self>
    where
        G: IntoIterator,
        G::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let entries: Vec<ConnectorTypeIdentifier> = global
            .into_iter()
            .filter_map(|entry| ConnectorTypeIdentifier::normalize(entry.as_ref()))
            .chain(
                project
                    .into_iter()
                    .filter_map(|entry| ConnectorTypeIdentifier::normalize(entry.as_ref())),
            )
            .filter(|entry| seen.insert(entry.clone()))
            .collect();

        if entries.is_empty() {
            return Err(AppError::Configuration(
                "no allowed connectors are configured for this project".to_owned(),
            ));
        }

        Ok(Self { entries })
    }

    /// Returns true when the connector type is permitted.
    #[must_use]
    pub fn contains(&self, connector_type: &ConnectorTypeIdentifier) -> bool {
        self.entries.contains(connector_type)
    }

    /// Returns the entries in resolution order.
    #[must_use]
    pub fn entries(&self) -> &[ConnectorTypeIdentifier] {
        &self.entries
    }
}

/// Splits the comma-separated value of the global allow-list record.
#[must_use]
pub fn split_global_allow_list(value: &str) -> Vec<String> {
    value.split(',').map(str::to_owned).collect()
}
