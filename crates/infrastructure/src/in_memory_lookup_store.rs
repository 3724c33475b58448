use std::collections::HashMap;

use async_trait::async_trait;
use connguard_application::{LookupEntity, LookupStore};
use connguard_core::AppResult;
use connguard_domain::{GLOBAL_ALLOW_LIST_PARTITION_KEY, GLOBAL_ALLOW_LIST_ROW_KEY};
use tokio::sync::RwLock;

/// In-memory lookup table store, keyed by table name.
#[derive(Debug, Default)]
pub struct InMemoryLookupStore {
    tables: RwLock<HashMap<String, Vec<LookupEntity>>>,
}

impl InMemoryLookupStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose `table_name` holds only the global allow-list record.
    #[must_use]
    pub fn with_global_allow_list(table_name: &str, connector_types: &[&str]) -> Self {
        let entity = LookupEntity {
            partition_key: GLOBAL_ALLOW_LIST_PARTITION_KEY.to_owned(),
            row_key: GLOBAL_ALLOW_LIST_ROW_KEY.to_owned(),
            values: Some(connector_types.join(",")),
        };

        Self {
            tables: RwLock::new(HashMap::from([(table_name.to_owned(), vec![entity])])),
        }
    }

    /// Inserts or replaces a record, matching on partition and row key.
    pub async fn upsert(&self, table_name: &str, entity: LookupEntity) {
        let mut tables = self.tables.write().await;
        let entities = tables.entry(table_name.to_owned()).or_default();

        match entities.iter_mut().find(|stored| {
            stored.partition_key == entity.partition_key && stored.row_key == entity.row_key
        }) {
            Some(stored) => *stored = entity,
            None => entities.push(entity),
        }
    }
}

#[async_trait]
impl LookupStore for InMemoryLookupStore {
    async fn query_entities(&self, table_name: &str) -> AppResult<Vec<LookupEntity>> {
        Ok(self
            .tables
            .read()
            .await
            .get(table_name)
            .cloned()
            .unwrap_or_default())
    }
}
