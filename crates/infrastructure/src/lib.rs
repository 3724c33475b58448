//! Infrastructure adapters for the connector compliance engine.

#![forbid(unsafe_code)]

mod arm_rest_client;
mod http_lookup_store;
mod http_project_metadata_service;
mod in_memory_lookup_store;
mod in_memory_project_metadata_service;
mod in_memory_remediation_journal;
mod json_file_remediation_journal;

pub use arm_rest_client::ArmRestClient;
pub use http_lookup_store::HttpLookupStore;
pub use http_project_metadata_service::HttpProjectMetadataService;
pub use in_memory_lookup_store::InMemoryLookupStore;
pub use in_memory_project_metadata_service::InMemoryProjectMetadataService;
pub use in_memory_remediation_journal::InMemoryRemediationJournal;
pub use json_file_remediation_journal::JsonFileRemediationJournal;
