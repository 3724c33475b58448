use async_trait::async_trait;
use connguard_application::{LookupEntity, LookupStore};
use connguard_core::{AppError, AppResult};
use serde::Deserialize;
use url::Url;

const TABLE_SERVICE_VERSION: &str = "2019-02-02";
const NEXT_PARTITION_KEY_HEADER: &str = "x-ms-continuation-NextPartitionKey";
const NEXT_ROW_KEY_HEADER: &str = "x-ms-continuation-NextRowKey";

/// Upper bound on continuation pages followed for one table query.
const MAX_QUERY_PAGES: usize = 50;

#[derive(Debug, Deserialize)]
struct TableQueryResponse {
    #[serde(default)]
    value: Vec<TableEntityResponse>,
}

#[derive(Debug, Deserialize)]
struct TableEntityResponse {
    #[serde(rename = "PartitionKey")]
    partition_key: String,
    #[serde(rename = "RowKey")]
    row_key: String,
    #[serde(default)]
    values: Option<String>,
}

/// Table storage adapter for the shared lookup table.
#[derive(Clone)]
pub struct HttpLookupStore {
    http_client: reqwest::Client,
    endpoint: String,
    sas_token: String,
}

impl HttpLookupStore {
    /// Creates a lookup store for a table service endpoint authorized by a SAS token.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        endpoint: impl Into<String>,
        sas_token: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into().trim_end_matches('/').to_owned(),
            sas_token: sas_token.into().trim_start_matches('?').to_owned(),
        }
    }

    fn query_url(&self, table_name: &str, continuation: Option<&(String, String)>) -> AppResult<Url> {
        let mut url = Url::parse(format!("{}/{table_name}()", self.endpoint).as_str())
            .map_err(|error| {
                AppError::Validation(format!("invalid lookup table endpoint: {error}"))
            })?;
        if !self.sas_token.is_empty() {
            url.set_query(Some(self.sas_token.as_str()));
        }
        if let Some((next_partition_key, next_row_key)) = continuation {
            url.query_pairs_mut()
                .append_pair("NextPartitionKey", next_partition_key)
                .append_pair("NextRowKey", next_row_key);
        }

        Ok(url)
    }
}

#[async_trait]
impl LookupStore for HttpLookupStore {
    async fn query_entities(&self, table_name: &str) -> AppResult<Vec<LookupEntity>> {
        let mut entities = Vec::new();
        let mut continuation: Option<(String, String)> = None;

        for _ in 0..MAX_QUERY_PAGES {
            let url = self.query_url(table_name, continuation.as_ref())?;
            let response = self
                .http_client
                .get(url)
                .header("Accept", "application/json;odata=nometadata")
                .header("x-ms-version", TABLE_SERVICE_VERSION)
                .send()
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to query table '{table_name}': {error}"))
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<body unavailable>".to_owned());
                return Err(AppError::Internal(format!(
                    "table '{table_name}' query returned status {}: {body}",
                    status.as_u16()
                )));
            }

            let header_value = |name: &str| {
                response
                    .headers()
                    .get(name)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_owned)
            };
            continuation = header_value(NEXT_PARTITION_KEY_HEADER)
                .zip(header_value(NEXT_ROW_KEY_HEADER).or_else(|| Some(String::new())));

            let page = response.json::<TableQueryResponse>().await.map_err(|error| {
                AppError::Internal(format!(
                    "failed to parse table '{table_name}' query response: {error}"
                ))
            })?;
            entities.extend(page.value.into_iter().map(|entity| LookupEntity {
                partition_key: entity.partition_key,
                row_key: entity.row_key,
                values: entity.values,
            }));

            if continuation.is_none() {
                return Ok(entities);
            }
        }

        Err(AppError::Internal(format!(
            "table '{table_name}' query exceeded {MAX_QUERY_PAGES} pages"
        )))
    }
}
