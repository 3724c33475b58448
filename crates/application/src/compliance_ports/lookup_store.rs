use async_trait::async_trait;
use connguard_core::AppResult;

/// One record of the shared lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupEntity {
    /// Partition key.
    pub partition_key: String,
    /// Row key.
    pub row_key: String,
    /// Stored value, when the record carries one.
    pub values: Option<String>,
}

/// Port for the key-value lookup table that holds global policy.
#[async_trait]
pub trait LookupStore: Send + Sync {
    /// Returns every record of the table.
    async fn query_entities(&self, table_name: &str) -> AppResult<Vec<LookupEntity>>;
}
