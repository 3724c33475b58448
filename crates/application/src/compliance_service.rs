use std::sync::Arc;

use crate::allow_list_resolver::AllowListResolver;
use crate::compliance_config::ComplianceConfig;
use crate::compliance_ports::{
    LookupStore, ProjectMetadataService, ProviderClient, RemediationJournal, WorkflowStore,
};
use crate::resource_existence_verifier::ResourceExistenceVerifier;

mod audit;
mod remediation;

/// Connector compliance service: audits workflow bindings and removes invalid ones.
#[derive(Clone)]
pub struct ComplianceService {
    config: Arc<ComplianceConfig>,
    workflow_store: Arc<dyn WorkflowStore>,
    provider: Arc<dyn ProviderClient>,
    project_metadata: Arc<dyn ProjectMetadataService>,
    allow_list_resolver: AllowListResolver,
    verifier: ResourceExistenceVerifier,
    remediation_journal: Option<Arc<dyn RemediationJournal>>,
}

impl ComplianceService {
    /// Creates a compliance service.
    #[must_use]
    pub fn new(
        config: ComplianceConfig,
        workflow_store: Arc<dyn WorkflowStore>,
        provider: Arc<dyn ProviderClient>,
        lookup_store: Arc<dyn LookupStore>,
        project_metadata: Arc<dyn ProjectMetadataService>,
    ) -> Self {
        let config = Arc::new(config);
        let allow_list_resolver = AllowListResolver::new(
            lookup_store,
            project_metadata.clone(),
            config.lookup_table_name(),
        );
        let verifier = ResourceExistenceVerifier::new(provider.clone(), config.clone());

        Self {
            config,
            workflow_store,
            provider,
            project_metadata,
            allow_list_resolver,
            verifier,
            remediation_journal: None,
        }
    }

    /// Adds a journal that makes interrupted remediations resumable.
    #[must_use]
    pub fn with_remediation_journal(
        mut self,
        remediation_journal: Arc<dyn RemediationJournal>,
    ) -> Self {
        self.remediation_journal = Some(remediation_journal);
        self
    }
}
