//! Application services and ports.

#![forbid(unsafe_code)]

mod allow_list_resolver;
mod compliance_config;
mod compliance_ports;
mod compliance_service;
mod resource_existence_verifier;

#[cfg(test)]
mod test_fakes;

pub use allow_list_resolver::AllowListResolver;
pub use compliance_config::{
    ComplianceConfig, DEFAULT_LOOKUP_TABLE_NAME, DEFAULT_MANAGEMENT_BASE_URL,
    DEFAULT_TRUSTED_SQL_AUTH_MODE, ProviderApiVersions,
};
pub use compliance_ports::{
    DeleteOutcome, LookupEntity, LookupStore, ProjectMetadataService, ProviderClient,
    RemediationJournal, WorkflowStore,
};
pub use compliance_service::ComplianceService;
pub use resource_existence_verifier::{InventoryCache, ResourceExistenceVerifier};
