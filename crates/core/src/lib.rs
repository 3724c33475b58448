//! Shared primitives for all connector guard crates.

#![forbid(unsafe_code)]

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Result type used across connector guard crates.
pub type AppResult<T> = Result<T, AppError>;

/// Directory tenant identifier that a connector authenticates against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(Uuid);

impl TenantId {
    /// Creates a tenant identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl FromStr for TenantId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid tenant id '{value}': {error}")))
    }
}

impl Display for TenantId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Policy or runtime configuration is unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transient read of connector details failed.
    #[error("lookup failure: {0}")]
    LookupFailure(String),

    /// Resource inventory listing failed while verifying existence.
    #[error("inventory scan failure: {0}")]
    InventoryScan(String),

    /// Connector delete or workflow rewrite failed.
    #[error("remediation failure: {0}")]
    Remediation(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::{AppError, TenantId};

    #[test]
    fn tenant_id_parses_case_insensitively() {
        let upper = "72F988BF-86F1-41AF-91AB-2D7CD011DB47".parse::<TenantId>();
        let lower = "72f988bf-86f1-41af-91ab-2d7cd011db47".parse::<TenantId>();
        assert!(upper.is_ok());
        assert!(lower.is_ok());
        assert_eq!(
            upper.unwrap_or_else(|_| unreachable!()),
            lower.unwrap_or_else(|_| unreachable!())
        );
    }

    #[test]
    fn tenant_id_rejects_non_uuid() {
        let parsed = "contoso".parse::<TenantId>();
        assert!(matches!(parsed, Err(AppError::Validation(_))));
    }
}
