use std::fmt::{Display, Formatter};

use connguard_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parameter name holding the connector bindings of a workflow.
pub const CONNECTIONS_PARAMETER: &str = "$connections";

/// Normalized connector category taken from the last segment of a binding's API id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectorTypeIdentifier(String);

impl ConnectorTypeIdentifier {
    /// Normalizes an allow-list entry or type name (trimmed, lower-cased).
    ///
    /// Returns `None` for blank input.
    #[must_use]
    pub fn normalize(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        Some(Self(normalized))
    }

    /// Derives the type identifier from a managed API id path.
    pub fn from_api_id(api_id: &str) -> AppResult<Self> {
        let last_segment = api_id.rsplit('/').next().unwrap_or_default();
        Self::normalize(last_segment).ok_or_else(|| {
            AppError::Validation(format!(
                "connector api id '{api_id}' does not end with a connector type"
            ))
        })
    }

    /// Returns the normalized identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ConnectorTypeIdentifier {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// One named connector binding declared in a workflow's `$connections` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorBinding {
    /// Alias the workflow uses to refer to the binding.
    #[serde(skip)]
    pub alias: String,
    /// Resource id of the provider-side connection instance.
    #[serde(rename = "connectionId")]
    pub connection_id: String,
    /// Managed API id whose last segment names the connector type.
    pub id: String,
}

impl ConnectorBinding {
    /// Returns the normalized connector type of this binding.
    pub fn connector_type(&self) -> AppResult<ConnectorTypeIdentifier> {
        ConnectorTypeIdentifier::from_api_id(self.id.as_str())
    }
}

/// A deployed workflow definition as returned by the workflow store.
///
/// The document is kept as raw JSON so that a rewrite only touches the
/// `$connections` map and preserves everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowResource {
    document: Value,
}

impl WorkflowResource {
    /// Wraps a workflow definition document.
    pub fn new(document: Value) -> AppResult<Self> {
        if !document.is_object() {
            return Err(AppError::Validation(
                "workflow definition must be a JSON object".to_owned(),
            ));
        }

        Ok(Self { document })
    }

    /// Returns the underlying document.
    #[must_use]
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Consumes the resource and returns the document.
    #[must_use]
    pub fn into_document(self) -> Value {
        self.document
    }

    /// Returns true when the workflow declares a `$connections` parameter.
    #[must_use]
    pub fn has_connections(&self) -> bool {
        self.connections_value().is_some()
    }

    /// Returns connector bindings ordered by alias.
    ///
    /// A workflow without a `$connections` parameter yields no bindings.
    pub fn connector_bindings(&self) -> AppResult<Vec<ConnectorBinding>> {
        let Some(connections) = self.connections_value() else {
            return Ok(Vec::new());
        };

        let connections = connections.as_object().ok_or_else(|| {
            AppError::Validation("$connections value must be a JSON object".to_owned())
        })?;

        connections
            .iter()
            .map(|(alias, binding)| {
                let mut binding: ConnectorBinding = serde_json::from_value(binding.clone())
                    .map_err(|error| {
                        AppError::Validation(format!(
                            "connector binding '{alias}' is malformed: {error}"
                        ))
                    })?;
                binding.alias = alias.clone();
                Ok(binding)
            })
            .collect()
    }

    /// Removes one alias from `$connections`; returns false when it was not present.
    pub fn remove_binding(&mut self, alias: &str) -> bool {
        self.connections_map_mut()
            .is_some_and(|connections| connections.remove(alias).is_some())
    }

    fn connections_value(&self) -> Option<&Value> {
        self.document
            .get("properties")?
            .get("parameters")?
            .get(CONNECTIONS_PARAMETER)?
            .get("value")
    }

    fn connections_map_mut(&mut self) -> Option<&mut Map<String, Value>> {
        self.document
            .get_mut("properties")?
            .get_mut("parameters")?
            .get_mut(CONNECTIONS_PARAMETER)?
            .get_mut("value")?
            .as_object_mut()
    }
}
