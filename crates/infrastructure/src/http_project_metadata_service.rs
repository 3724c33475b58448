use async_trait::async_trait;
use connguard_application::ProjectMetadataService;
use connguard_core::{AppError, AppResult};
use connguard_domain::ProjectContext;
use reqwest::StatusCode;

/// REST client for the project metadata service.
#[derive(Clone)]
pub struct HttpProjectMetadataService {
    http_client: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl HttpProjectMetadataService {
    /// Creates a metadata client rooted at `base_url`.
    #[must_use]
    pub fn new(http_client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            access_token: None,
        }
    }

    /// Sends a bearer token with every request.
    #[must_use]
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }
}

#[async_trait]
impl ProjectMetadataService for HttpProjectMetadataService {
    async fn get_project_info(&self, project_id: &str) -> AppResult<ProjectContext> {
        let url = format!("{}/projects/{project_id}", self.base_url);
        let mut request = self.http_client.get(url.as_str());
        if let Some(access_token) = &self.access_token {
            request = request.bearer_auth(access_token);
        }

        let response = request.send().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to request project metadata for '{project_id}': {error}"
            ))
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("project '{project_id}' does not exist")));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_owned());
            return Err(AppError::Internal(format!(
                "project metadata for '{project_id}' returned status {}: {body}",
                status.as_u16()
            )));
        }

        response.json::<ProjectContext>().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to parse project metadata for '{project_id}': {error}"
            ))
        })
    }
}
