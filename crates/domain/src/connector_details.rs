use connguard_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Provider-side property bag of one connection instance.
///
/// The shape depends on the connector type: credentials are found under
/// `nonSecretParameterValues`, `parameterValueSet` or `authenticatedUser`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectorDetails {
    document: Value,
}

impl ConnectorDetails {
    /// Wraps a connection document returned by the provider.
    #[must_use]
    pub fn new(document: Value) -> Self {
        Self { document }
    }

    /// Returns one value from `properties.nonSecretParameterValues`.
    #[must_use]
    pub fn non_secret_parameter(&self, key: &str) -> Option<&str> {
        self.properties()?
            .get("nonSecretParameterValues")?
            .get(key)?
            .as_str()
    }

    /// Returns one value from `properties.nonSecretParameterValues` or a validation error.
    pub fn required_non_secret_parameter(&self, key: &str) -> AppResult<&str> {
        self.non_secret_parameter(key).ok_or_else(|| {
            AppError::Validation(format!(
                "connection details are missing nonSecretParameterValues.{key}"
            ))
        })
    }

    /// Returns the authentication mode name from `properties.parameterValueSet.name`.
    #[must_use]
    pub fn parameter_value_set_name(&self) -> Option<&str> {
        self.properties()?
            .get("parameterValueSet")?
            .get("name")?
            .as_str()
    }

    /// Returns `properties.parameterValueSet.values.<key>.value`.
    #[must_use]
    pub fn parameter_value_set_value(&self, key: &str) -> Option<&str> {
        self.properties()?
            .get("parameterValueSet")?
            .get("values")?
            .get(key)?
            .get("value")?
            .as_str()
    }

    /// Returns the identity the connection was authorized with, if any.
    #[must_use]
    pub fn authenticated_user_name(&self) -> Option<&str> {
        self.properties()?
            .get("authenticatedUser")?
            .get("name")?
            .as_str()
    }

    fn properties(&self) -> Option<&Value> {
        self.document.get("properties")
    }
}
