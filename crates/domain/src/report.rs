use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of one binding in an audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingVerdict {
    /// Binding satisfies policy.
    Valid,
    /// Binding must be removed.
    Invalid,
    /// Connection details could not be read; binding kept.
    Skipped,
}

/// Per-binding audit result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingFinding {
    /// Alias of the binding inside the workflow.
    pub alias: String,
    /// Provider connection resource id.
    pub connection_id: String,
    /// Normalized connector type.
    pub connector_type: String,
    /// Classification.
    pub verdict: FindingVerdict,
    /// Explanation of the classification.
    pub reason: String,
}

/// Result of one compliance audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// Audited workflow.
    pub resource_id: String,
    /// True iff no binding was found invalid.
    pub status: bool,
    /// Connection ids to remove, in binding order.
    pub invalid_connectors: Vec<String>,
    /// Per-binding details.
    pub findings: Vec<BindingFinding>,
    /// When the audit completed.
    pub audited_at: DateTime<Utc>,
}

impl ComplianceReport {
    /// Builds a report from findings; status and invalid ids are derived.
    #[must_use]
    pub fn from_findings(resource_id: impl Into<String>, findings: Vec<BindingFinding>) -> Self {
        let invalid_connectors: Vec<String> = findings
            .iter()
            .filter(|finding| finding.verdict == FindingVerdict::Invalid)
            .map(|finding| finding.connection_id.clone())
            .collect();

        Self {
            resource_id: resource_id.into(),
            status: invalid_connectors.is_empty(),
            invalid_connectors,
            findings,
            audited_at: Utc::now(),
        }
    }

    /// Report for a workflow that declares no connectors.
    #[must_use]
    pub fn compliant_without_connectors(resource_id: impl Into<String>) -> Self {
        Self::from_findings(resource_id, Vec::new())
    }
}

/// Result of removing invalid bindings from a workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationReport {
    /// Connections deleted by this invocation.
    pub deleted: Vec<String>,
    /// Connections that were already gone or deleted by an interrupted run.
    pub already_absent: Vec<String>,
    /// Workflow aliases removed from `$connections`.
    pub removed_aliases: Vec<String>,
    /// Whether the workflow definition was rewritten.
    pub workflow_updated: bool,
}
