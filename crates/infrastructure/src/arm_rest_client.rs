use async_trait::async_trait;
use connguard_application::{DeleteOutcome, ProviderClient, WorkflowStore};
use connguard_core::{AppError, AppResult};
use connguard_domain::{ResourceId, WorkflowResource};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Upper bound on `nextLink` pages followed for one listing.
const MAX_LIST_PAGES: usize = 50;

/// Management REST client for workflows, connections and resource listings.
#[derive(Clone)]
pub struct ArmRestClient {
    http_client: reqwest::Client,
    base_url: String,
    access_token: String,
    workflow_api_version: String,
}

impl ArmRestClient {
    /// Creates a management client authenticated with a pre-acquired bearer token.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        workflow_api_version: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            access_token: access_token.into(),
            workflow_api_version: workflow_api_version.into(),
        }
    }

    fn workflow_url(&self, resource_id: &ResourceId) -> String {
        format!(
            "{}/{}",
            self.base_url,
            resource_id.as_str().trim_start_matches('/')
        )
    }

    async fn get_page(&self, url: Url) -> AppResult<Value> {
        debug!(url = %url, "management GET");
        let response = self
            .http_client
            .get(url.clone())
            .bearer_auth(self.access_token.as_str())
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("GET {url} failed: {error}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("GET {url} returned 404")));
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_owned());
            return Err(AppError::Internal(format!(
                "GET {url} returned status {}: {body}",
                status.as_u16()
            )));
        }

        response.json::<Value>().await.map_err(|error| {
            AppError::Internal(format!("failed to parse GET {url} response body: {error}"))
        })
    }
}

#[async_trait]
impl ProviderClient for ArmRestClient {
    async fn get_json(&self, url: &str, api_version: &str) -> AppResult<Value> {
        let mut document = self.get_page(with_api_version(url, api_version)?).await?;

        let mut pages = 1;
        while let Some(next_link) = document
            .get("nextLink")
            .and_then(Value::as_str)
            .map(str::to_owned)
        {
            if pages >= MAX_LIST_PAGES {
                return Err(AppError::Internal(format!(
                    "listing {url} exceeded {MAX_LIST_PAGES} pages"
                )));
            }

            let mut next_page = self
                .get_page(with_api_version(next_link.as_str(), api_version)?)
                .await?;
            let next_values = match next_page.get_mut("value").map(Value::take) {
                Some(Value::Array(values)) => values,
                _ => Vec::new(),
            };

            match document.get_mut("value") {
                Some(Value::Array(values)) => values.extend(next_values),
                _ => break,
            }

            match next_page.get("nextLink").cloned() {
                Some(link) => document["nextLink"] = link,
                None => {
                    if let Some(object) = document.as_object_mut() {
                        object.remove("nextLink");
                    }
                }
            }
            pages += 1;
        }

        Ok(document)
    }

    async fn delete(&self, url: &str, api_version: &str) -> AppResult<DeleteOutcome> {
        let url = with_api_version(url, api_version)?;
        debug!(url = %url, "management DELETE");
        let response = self
            .http_client
            .delete(url.clone())
            .bearer_auth(self.access_token.as_str())
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("DELETE {url} failed: {error}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(DeleteOutcome::NotFound);
        }

        if status.is_success() {
            return Ok(DeleteOutcome::Deleted);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_owned());
        Err(AppError::Internal(format!(
            "DELETE {url} returned status {}: {body}",
            status.as_u16()
        )))
    }
}

#[async_trait]
impl WorkflowStore for ArmRestClient {
    async fn get_workflow(&self, resource_id: &ResourceId) -> AppResult<WorkflowResource> {
        let url = with_api_version(
            self.workflow_url(resource_id).as_str(),
            self.workflow_api_version.as_str(),
        )?;
        WorkflowResource::new(self.get_page(url).await?)
    }

    async fn put_workflow(
        &self,
        resource_id: &ResourceId,
        workflow: &WorkflowResource,
    ) -> AppResult<()> {
        let url = with_api_version(
            self.workflow_url(resource_id).as_str(),
            self.workflow_api_version.as_str(),
        )?;
        debug!(url = %url, "management PUT");
        let response = self
            .http_client
            .put(url.clone())
            .bearer_auth(self.access_token.as_str())
            .json(workflow.document())
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("PUT {url} failed: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_owned());
            return Err(AppError::Internal(format!(
                "PUT {url} returned status {}: {body}",
                status.as_u16()
            )));
        }

        Ok(())
    }
}

/// Parses `url` and adds `api-version` unless a continuation link already carries one.
fn with_api_version(url: &str, api_version: &str) -> AppResult<Url> {
    let mut parsed = Url::parse(url)
        .map_err(|error| AppError::Validation(format!("invalid management url '{url}': {error}")))?;
    if !parsed.query_pairs().any(|(key, _)| key == "api-version") {
        parsed
            .query_pairs_mut()
            .append_pair("api-version", api_version);
    }

    Ok(parsed)
}
