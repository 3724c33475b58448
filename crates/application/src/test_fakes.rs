//! Hand-written port fakes shared by the service tests.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use connguard_core::{AppError, AppResult, TenantId};
use connguard_domain::{
    Application, Environment, ProjectContext, ResourceId, RulePolicy, WorkflowResource,
};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::compliance_config::ComplianceConfig;
use crate::compliance_ports::{
    DeleteOutcome, LookupEntity, LookupStore, ProjectMetadataService, ProviderClient,
    RemediationJournal, WorkflowStore,
};

pub(crate) const TRUSTED_TENANT: &str = "11111111-2222-3333-4444-555555555555";

pub(crate) fn test_config() -> ComplianceConfig {
    let tenant = TRUSTED_TENANT
        .parse::<TenantId>()
        .unwrap_or_else(|_| unreachable!());
    ComplianceConfig::new(
        "https://management.test",
        RulePolicy::new("contoso.com", tenant, "sqlauthentication"),
    )
}

pub(crate) fn project(applications: &[(&str, &[&str])]) -> ProjectContext {
    ProjectContext {
        project_id: "ACME".to_owned(),
        subscription_id: "sub-1".to_owned(),
        allowed_connectors: Vec::new(),
        applications: applications
            .iter()
            .map(|(name, resource_groups)| Application {
                name: (*name).to_owned(),
                environments: resource_groups
                    .iter()
                    .map(|resource_group| Environment {
                        name: resource_group.rsplit('-').next().unwrap_or_default().to_owned(),
                        resource_group: (*resource_group).to_owned(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

pub(crate) fn listing(names: &[&str]) -> Value {
    json!({
        "value": names
            .iter()
            .map(|name| json!({"name": name, "properties": {}}))
            .collect::<Vec<_>>()
    })
}

#[derive(Default)]
pub(crate) struct FakeProviderClient {
    documents: Mutex<HashMap<String, Value>>,
    failing_gets: Mutex<HashSet<String>>,
    failing_deletes: Mutex<HashSet<String>>,
    missing_deletes: Mutex<HashSet<String>>,
    get_delay: Mutex<Option<Duration>>,
    calls: Mutex<Vec<String>>,
}

impl FakeProviderClient {
    pub(crate) async fn insert(&self, url: &str, document: Value) {
        self.documents.lock().await.insert(url.to_owned(), document);
    }

    pub(crate) async fn fail_get(&self, url: &str) {
        self.failing_gets.lock().await.insert(url.to_owned());
    }

    pub(crate) async fn fail_delete(&self, url: &str) {
        self.failing_deletes.lock().await.insert(url.to_owned());
    }

    pub(crate) async fn already_deleted(&self, url: &str) {
        self.missing_deletes.lock().await.insert(url.to_owned());
    }

    pub(crate) async fn delay_gets(&self, delay: Duration) {
        *self.get_delay.lock().await = Some(delay);
    }

    pub(crate) async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ProviderClient for FakeProviderClient {
    async fn get_json(&self, url: &str, _api_version: &str) -> AppResult<Value> {
        self.calls.lock().await.push(format!("GET {url}"));

        let delay = *self.get_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing_gets.lock().await.contains(url) {
            return Err(AppError::Internal(format!("simulated GET failure for {url}")));
        }

        self.documents
            .lock()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("no fake document for {url}")))
    }

    async fn delete(&self, url: &str, _api_version: &str) -> AppResult<DeleteOutcome> {
        self.calls.lock().await.push(format!("DELETE {url}"));

        if self.failing_deletes.lock().await.contains(url) {
            return Err(AppError::Internal(format!(
                "simulated DELETE failure for {url}"
            )));
        }

        if self.missing_deletes.lock().await.contains(url) {
            return Ok(DeleteOutcome::NotFound);
        }

        Ok(DeleteOutcome::Deleted)
    }
}

pub(crate) struct FakeWorkflowStore {
    workflow: Mutex<WorkflowResource>,
    reads: Mutex<u32>,
    puts: Mutex<Vec<WorkflowResource>>,
    put_failures: Mutex<u32>,
}

impl FakeWorkflowStore {
    pub(crate) fn new(document: Value) -> Self {
        Self {
            workflow: Mutex::new(WorkflowResource::new(document).unwrap_or_else(|_| unreachable!())),
            reads: Mutex::new(0),
            puts: Mutex::new(Vec::new()),
            put_failures: Mutex::new(0),
        }
    }

    pub(crate) fn failing_first_put(document: Value) -> Self {
        Self {
            put_failures: Mutex::new(1),
            ..Self::new(document)
        }
    }

    pub(crate) async fn reads(&self) -> u32 {
        *self.reads.lock().await
    }

    pub(crate) async fn puts(&self) -> Vec<WorkflowResource> {
        self.puts.lock().await.clone()
    }

    pub(crate) async fn current(&self) -> WorkflowResource {
        self.workflow.lock().await.clone()
    }
}

#[async_trait]
impl WorkflowStore for FakeWorkflowStore {
    async fn get_workflow(&self, _resource_id: &ResourceId) -> AppResult<WorkflowResource> {
        *self.reads.lock().await += 1;
        Ok(self.workflow.lock().await.clone())
    }

    async fn put_workflow(
        &self,
        _resource_id: &ResourceId,
        workflow: &WorkflowResource,
    ) -> AppResult<()> {
        let mut put_failures = self.put_failures.lock().await;
        if *put_failures > 0 {
            *put_failures -= 1;
            return Err(AppError::Internal("simulated workflow update failure".to_owned()));
        }

        self.puts.lock().await.push(workflow.clone());
        *self.workflow.lock().await = workflow.clone();
        Ok(())
    }
}

pub(crate) struct FakeLookupStore {
    entities: Vec<LookupEntity>,
    fail: bool,
    queries: Mutex<u32>,
}

impl FakeLookupStore {
    pub(crate) fn new(entities: Vec<LookupEntity>) -> Self {
        Self {
            entities,
            fail: false,
            queries: Mutex::new(0),
        }
    }

    pub(crate) fn with_global(values: &str) -> Self {
        Self::new(vec![LookupEntity {
            partition_key: "Lookup".to_owned(),
            row_key: "allowed_connectors".to_owned(),
            values: Some(values.to_owned()),
        }])
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub(crate) async fn queries(&self) -> u32 {
        *self.queries.lock().await
    }
}

#[async_trait]
impl LookupStore for FakeLookupStore {
    async fn query_entities(&self, _table_name: &str) -> AppResult<Vec<LookupEntity>> {
        *self.queries.lock().await += 1;
        if self.fail {
            return Err(AppError::Internal("simulated lookup outage".to_owned()));
        }

        Ok(self.entities.clone())
    }
}

pub(crate) struct FakeProjectMetadataService {
    project: ProjectContext,
    requests: Mutex<Vec<String>>,
}

impl FakeProjectMetadataService {
    pub(crate) fn new(project: ProjectContext) -> Self {
        Self {
            project,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) async fn requests(&self) -> Vec<String> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl ProjectMetadataService for FakeProjectMetadataService {
    async fn get_project_info(&self, project_id: &str) -> AppResult<ProjectContext> {
        self.requests.lock().await.push(project_id.to_owned());
        Ok(self.project.clone())
    }
}

#[derive(Default)]
pub(crate) struct FakeRemediationJournal {
    entries: Mutex<HashMap<String, Vec<String>>>,
}

impl FakeRemediationJournal {
    pub(crate) async fn entries_for(&self, resource_id: &str) -> Vec<String> {
        self.entries
            .lock()
            .await
            .get(resource_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl RemediationJournal for FakeRemediationJournal {
    async fn record_deleted(
        &self,
        resource_id: &ResourceId,
        connection_id: &str,
    ) -> AppResult<()> {
        self.entries
            .lock()
            .await
            .entry(resource_id.as_str().to_owned())
            .or_default()
            .push(connection_id.to_owned());
        Ok(())
    }

    async fn deleted_connections(&self, resource_id: &ResourceId) -> AppResult<Vec<String>> {
        Ok(self.entries_for(resource_id.as_str()).await)
    }

    async fn clear(&self, resource_id: &ResourceId) -> AppResult<()> {
        self.entries.lock().await.remove(resource_id.as_str());
        Ok(())
    }
}
