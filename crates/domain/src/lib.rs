//! Domain model of workflow connector compliance.

#![forbid(unsafe_code)]

mod allow_list;
mod connection;
mod connector_details;
mod connector_rule;
mod project;
mod report;
mod resource_id;

pub use allow_list::{
    AllowList, GLOBAL_ALLOW_LIST_PARTITION_KEY, GLOBAL_ALLOW_LIST_ROW_KEY,
    split_global_allow_list,
};
pub use connection::{
    CONNECTIONS_PARAMETER, ConnectorBinding, ConnectorTypeIdentifier, WorkflowResource,
};
pub use connector_details::ConnectorDetails;
pub use connector_rule::{ConnectorRule, ResourceKind, RulePolicy, RuleVerdict};
pub use project::{Application, Environment, ProjectContext};
pub use report::{BindingFinding, ComplianceReport, FindingVerdict, RemediationReport};
pub use resource_id::ResourceId;
