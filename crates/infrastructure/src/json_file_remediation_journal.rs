use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use connguard_application::RemediationJournal;
use connguard_core::{AppError, AppResult};
use connguard_domain::ResourceId;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

#[derive(Debug, Default, Serialize, Deserialize)]
struct JournalDocument {
    #[serde(default)]
    workflows: BTreeMap<String, Vec<String>>,
}

/// Remediation journal persisted as a JSON document on local disk.
///
/// The whole file is rewritten on every change through a sibling temp file
/// and a rename, so readers never see a half-written journal.
#[derive(Debug)]
pub struct JsonFileRemediationJournal {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileRemediationJournal {
    /// Creates a journal stored at `path`. The file is created lazily.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the journal file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    async fn load(&self) -> AppResult<JournalDocument> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(JournalDocument::default());
            }
            Err(error) => {
                return Err(AppError::Internal(format!(
                    "failed to read remediation journal '{}': {error}",
                    self.path.display()
                )));
            }
        };

        serde_json::from_str(&contents).map_err(|error| {
            AppError::Internal(format!(
                "remediation journal '{}' is corrupt: {error}",
                self.path.display()
            ))
        })
    }

    async fn store(&self, document: &JournalDocument) -> AppResult<()> {
        if document.workflows.is_empty() {
            return match tokio::fs::remove_file(&self.path).await {
                Ok(()) => Ok(()),
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(error) => Err(AppError::Internal(format!(
                    "failed to remove remediation journal '{}': {error}",
                    self.path.display()
                ))),
            };
        }

        let contents = serde_json::to_vec_pretty(document).map_err(|error| {
            AppError::Internal(format!("failed to serialize remediation journal: {error}"))
        })?;
        let staging_path = self.path.with_extension("tmp");
        tokio::fs::write(&staging_path, contents)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to write remediation journal '{}': {error}",
                    staging_path.display()
                ))
            })?;
        tokio::fs::rename(&staging_path, &self.path)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to replace remediation journal '{}': {error}",
                    self.path.display()
                ))
            })
    }
}

#[async_trait]
impl RemediationJournal for JsonFileRemediationJournal {
    async fn record_deleted(
        &self,
        resource_id: &ResourceId,
        connection_id: &str,
    ) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        let deleted = document
            .workflows
            .entry(resource_id.as_str().to_owned())
            .or_default();
        if deleted.iter().any(|stored| stored == connection_id) {
            return Ok(());
        }

        deleted.push(connection_id.to_owned());
        self.store(&document).await
    }

    async fn deleted_connections(&self, resource_id: &ResourceId) -> AppResult<Vec<String>> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;

        Ok(document
            .workflows
            .remove(resource_id.as_str())
            .unwrap_or_default())
    }

    async fn clear(&self, resource_id: &ResourceId) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        if document.workflows.remove(resource_id.as_str()).is_none() {
            return Ok(());
        }

        self.store(&document).await
    }
}
