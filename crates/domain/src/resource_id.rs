use std::fmt::{Display, Formatter};

use connguard_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Parsed management resource identifier of a deployed workflow.
///
/// The identifier is kept verbatim; only the segments the compliance engine
/// needs (subscription, resource group) are extracted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId {
    raw: String,
    subscription_id: Option<String>,
    resource_group: String,
}

impl ResourceId {
    /// Parses a resource identifier that contains a `resourceGroups` segment.
    pub fn parse(value: impl Into<String>) -> AppResult<Self> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "resource id must not be empty".to_owned(),
            ));
        }

        let segments: Vec<&str> = trimmed
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();

        let resource_group = segment_after(&segments, "resourcegroups").ok_or_else(|| {
            AppError::Validation(format!(
                "resource id '{trimmed}' does not contain a resource group segment"
            ))
        })?;
        let subscription_id = segment_after(&segments, "subscriptions");

        Ok(Self {
            raw: trimmed.to_owned(),
            subscription_id: subscription_id.map(str::to_owned),
            resource_group: resource_group.to_owned(),
        })
    }

    /// Returns the identifier as originally supplied (trimmed).
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.raw.as_str()
    }

    /// Returns the resource group segment.
    #[must_use]
    pub fn resource_group(&self) -> &str {
        self.resource_group.as_str()
    }

    /// Returns the subscription segment when present.
    #[must_use]
    pub fn subscription_id(&self) -> Option<&str> {
        self.subscription_id.as_deref()
    }

    /// Derives the owning project identifier from the resource group name.
    ///
    /// Resource groups are named `<project>-<application>-<environment>`; the
    /// last two dash-delimited segments are stripped and the rest upper-cased.
    #[must_use]
    pub fn project_id(&self) -> String {
        let mut parts = self.resource_group.rsplitn(3, '-').collect::<Vec<_>>();
        let project = parts.pop().unwrap_or_default();
        project.to_uppercase()
    }
}

impl Display for ResourceId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.raw.as_str())
    }
}

impl TryFrom<String> for ResourceId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ResourceId> for String {
    fn from(value: ResourceId) -> Self {
        value.raw
    }
}

fn segment_after<'a>(segments: &[&'a str], key: &str) -> Option<&'a str> {
    segments
        .windows(2)
        .find(|pair| pair[0].eq_ignore_ascii_case(key))
        .map(|pair| pair[1])
}

#[cfg(test)]
mod tests {
    use super::ResourceId;

    const WORKFLOW_ID: &str = "/subscriptions/0000-1111/resourceGroups/acme-billing-dev/providers/Microsoft.Logic/workflows/invoices";

    #[test]
    fn parses_subscription_and_resource_group() {
        let parsed = ResourceId::parse(WORKFLOW_ID);
        assert!(parsed.is_ok());
        let parsed = parsed.unwrap_or_else(|_| unreachable!());

        assert_eq!(parsed.subscription_id(), Some("0000-1111"));
        assert_eq!(parsed.resource_group(), "acme-billing-dev");
    }

    #[test]
    fn project_id_strips_last_two_segments() {
        let parsed = ResourceId::parse(WORKFLOW_ID).unwrap_or_else(|_| unreachable!());
        assert_eq!(parsed.project_id(), "ACME");

        let parsed = ResourceId::parse("/subscriptions/s/resourcegroups/big-data-lake-prod/x")
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(parsed.project_id(), "BIG-DATA");
    }

    #[test]
    fn project_id_tolerates_short_resource_group_names() {
        let two = ResourceId::parse("/resourceGroups/acme-dev").unwrap_or_else(|_| unreachable!());
        assert_eq!(two.project_id(), "ACME");

        let one = ResourceId::parse("/resourceGroups/acme").unwrap_or_else(|_| unreachable!());
        assert_eq!(one.project_id(), "ACME");
    }

    #[test]
    fn rejects_identifier_without_resource_group() {
        assert!(ResourceId::parse("/subscriptions/0000/providers/Microsoft.Logic").is_err());
        assert!(ResourceId::parse("  ").is_err());
    }
}
