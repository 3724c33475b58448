mod lookup_store;
mod project_metadata;
mod provider_client;
mod remediation_journal;
mod workflow_store;

pub use lookup_store::{LookupEntity, LookupStore};
pub use project_metadata::ProjectMetadataService;
pub use provider_client::{DeleteOutcome, ProviderClient};
pub use remediation_journal::RemediationJournal;
pub use workflow_store::WorkflowStore;
