use std::fmt::{Display, Formatter};

use connguard_core::{AppResult, TenantId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::connection::ConnectorTypeIdentifier;
use crate::connector_details::ConnectorDetails;

/// Provider resource collection scanned by existence checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Document database accounts.
    DocumentDbAccount,
    /// Storage accounts backing blob, table and queue connectors.
    StorageAccount,
    /// SQL servers, matched by fully-qualified domain name.
    SqlServer,
    /// Telemetry components, matched by application id.
    InsightsComponent,
}

impl ResourceKind {
    /// Returns the provider path listed under a resource group.
    #[must_use]
    pub fn provider_path(self) -> &'static str {
        match self {
            Self::DocumentDbAccount => "Microsoft.DocumentDB/databaseAccounts",
            Self::StorageAccount => "Microsoft.Storage/storageAccounts",
            Self::SqlServer => "Microsoft.Sql/servers",
            Self::InsightsComponent => "Microsoft.Insights/components",
        }
    }

    /// Returns the value of a listed instance that candidate names are compared with.
    #[must_use]
    pub fn comparable_value(self, instance: &Value) -> Option<&str> {
        match self {
            Self::DocumentDbAccount | Self::StorageAccount => instance.get("name")?.as_str(),
            Self::SqlServer => instance
                .get("properties")?
                .get("fullyQualifiedDomainName")?
                .as_str(),
            Self::InsightsComponent => instance.get("properties")?.get("AppId")?.as_str(),
        }
    }

    /// Returns true when the listed instance matches the candidate name (case-insensitive).
    #[must_use]
    pub fn matches(self, instance: &Value, candidate: &str) -> bool {
        self.comparable_value(instance)
            .is_some_and(|value| value.eq_ignore_ascii_case(candidate))
    }
}

impl Display for ResourceKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.provider_path())
    }
}

/// Trust settings the connector rules are evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulePolicy {
    trusted_domain_suffix: String,
    trusted_tenant_id: TenantId,
    trusted_sql_auth_mode: String,
}

impl RulePolicy {
    /// Creates a rule policy; suffix and auth mode are compared case-insensitively.
    #[must_use]
    pub fn new(
        trusted_domain_suffix: impl Into<String>,
        trusted_tenant_id: TenantId,
        trusted_sql_auth_mode: impl Into<String>,
    ) -> Self {
        Self {
            trusted_domain_suffix: trusted_domain_suffix.into().trim().to_lowercase(),
            trusted_tenant_id,
            trusted_sql_auth_mode: trusted_sql_auth_mode.into().trim().to_lowercase(),
        }
    }

    /// Returns the normalized trusted suffix.
    #[must_use]
    pub fn trusted_domain_suffix(&self) -> &str {
        self.trusted_domain_suffix.as_str()
    }

    /// Returns the trusted directory tenant.
    #[must_use]
    pub fn trusted_tenant_id(&self) -> TenantId {
        self.trusted_tenant_id
    }

    fn is_trusted_name(&self, value: &str) -> bool {
        value
            .to_lowercase()
            .ends_with(self.trusted_domain_suffix.as_str())
    }

    fn is_trusted_tenant(&self, value: Option<&str>) -> bool {
        value
            .and_then(|value| value.parse::<TenantId>().ok())
            .is_some_and(|tenant_id| tenant_id == self.trusted_tenant_id)
    }
}

/// Outcome of evaluating one connector rule against connection details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleVerdict {
    /// The binding satisfies its rule.
    Compliant {
        /// Human readable explanation.
        reason: String,
    },
    /// The binding violates its rule.
    Violation {
        /// Human readable explanation.
        reason: String,
    },
    /// The binding is compliant only if the named resource exists in the project.
    RequiresResource {
        /// Resource collection to scan.
        kind: ResourceKind,
        /// Name compared against the collection (case-insensitive).
        name: String,
    },
}

/// Verification rule selected by connector type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorRule {
    /// Document database account must exist.
    DocumentDb,
    /// Blob storage account must exist (`accountName`).
    BlobStorage,
    /// Table or queue storage account must exist (`storageaccount`).
    TableOrQueueStorage,
    /// SQL data warehouse server must exist.
    SqlDataWarehouse,
    /// SQL server: trusted suffix exemption, else existence by FQDN.
    Sql,
    /// Authenticated user must belong to the trusted organization.
    OrganizationalIdentity,
    /// Telemetry component must exist.
    ApplicationInsights,
    /// Bound tenant must be trusted, and so must the user when present.
    FederatedTenant,
    /// Allow-list membership alone is sufficient.
    AllowListOnly,
}

impl ConnectorRule {
    /// Selects the rule for a normalized connector type.
    #[must_use]
    pub fn for_connector_type(connector_type: &ConnectorTypeIdentifier) -> Self {
        match connector_type.as_str() {
            "documentdb" => Self::DocumentDb,
            "azureblob" => Self::BlobStorage,
            "azuretables" | "azurequeues" => Self::TableOrQueueStorage,
            "sqldw" => Self::SqlDataWarehouse,
            "sql" => Self::Sql,
            "office365" | "excelonlinebusiness" | "sharepointonline" => {
                Self::OrganizationalIdentity
            }
            "applicationinsights" => Self::ApplicationInsights,
            "azuredatafactory" | "azuredatalake" => Self::FederatedTenant,
            _ => Self::AllowListOnly,
        }
    }

    /// Evaluates the rule. Missing required fields are validation errors.
    pub fn evaluate(self, details: &ConnectorDetails, policy: &RulePolicy) -> AppResult<RuleVerdict> {
        let verdict = match self {
            Self::DocumentDb => requires(
                ResourceKind::DocumentDbAccount,
                details.required_non_secret_parameter("databaseAccount")?,
            ),
            Self::BlobStorage => requires(
                ResourceKind::StorageAccount,
                details.required_non_secret_parameter("accountName")?,
            ),
            Self::TableOrQueueStorage => requires(
                ResourceKind::StorageAccount,
                details.required_non_secret_parameter("storageaccount")?,
            ),
            Self::SqlDataWarehouse => requires(
                ResourceKind::SqlServer,
                details.required_non_secret_parameter("server")?,
            ),
            Self::Sql => evaluate_sql(details, policy),
            Self::OrganizationalIdentity => match details.authenticated_user_name() {
                Some(user) if policy.is_trusted_name(user) => RuleVerdict::Compliant {
                    reason: format!("authenticated user '{user}' is trusted"),
                },
                Some(user) => RuleVerdict::Violation {
                    reason: format!("authenticated user '{user}' is outside the trusted domain"),
                },
                None => RuleVerdict::Violation {
                    reason: "connection has no authenticated user".to_owned(),
                },
            },
            Self::ApplicationInsights => requires(
                ResourceKind::InsightsComponent,
                details.required_non_secret_parameter("username")?,
            ),
            Self::FederatedTenant => evaluate_federated_tenant(details, policy),
            Self::AllowListOnly => RuleVerdict::Compliant {
                reason: "allow-listed connector type without additional rule".to_owned(),
            },
        };

        Ok(verdict)
    }
}

fn requires(kind: ResourceKind, name: &str) -> RuleVerdict {
    RuleVerdict::RequiresResource {
        kind,
        name: name.to_lowercase(),
    }
}

fn evaluate_sql(details: &ConnectorDetails, policy: &RulePolicy) -> RuleVerdict {
    let auth_mode = details.parameter_value_set_name().unwrap_or_default();
    if !auth_mode.eq_ignore_ascii_case(policy.trusted_sql_auth_mode.as_str()) {
        return RuleVerdict::Compliant {
            reason: format!("sql authentication mode '{auth_mode}' is not verified"),
        };
    }

    match details.parameter_value_set_value("server") {
        Some(server) if policy.is_trusted_name(server) => RuleVerdict::Compliant {
            reason: format!("sql server '{server}' is in the trusted domain"),
        },
        Some(server) => requires(ResourceKind::SqlServer, server),
        None => RuleVerdict::Violation {
            reason: "sql connection does not name a server".to_owned(),
        },
    }
}

fn evaluate_federated_tenant(details: &ConnectorDetails, policy: &RulePolicy) -> RuleVerdict {
    let tenant = details.non_secret_parameter("token:TenantId");
    let tenant_trusted = policy.is_trusted_tenant(tenant);
    let tenant_label = tenant.unwrap_or("<none>");

    match details.authenticated_user_name() {
        Some(user) if policy.is_trusted_name(user) && tenant_trusted => RuleVerdict::Compliant {
            reason: format!("user '{user}' and tenant '{tenant_label}' are trusted"),
        },
        Some(user) => RuleVerdict::Violation {
            reason: format!("user '{user}' or tenant '{tenant_label}' is not trusted"),
        },
        None if tenant_trusted => RuleVerdict::Compliant {
            reason: format!("service principal tenant '{tenant_label}' is trusted"),
        },
        None => RuleVerdict::Violation {
            reason: format!("service principal tenant '{tenant_label}' is not trusted"),
        },
    }
}

#[cfg(test)]
mod tests {
    use connguard_core::TenantId;
    use serde_json::json;

    use super::{ConnectorRule, ResourceKind, RulePolicy, RuleVerdict};
    use crate::{ConnectorDetails, ConnectorTypeIdentifier};

    const TRUSTED_TENANT: &str = "11111111-2222-3333-4444-555555555555";

    fn policy() -> RulePolicy {
        let tenant = TRUSTED_TENANT.parse::<TenantId>().unwrap_or_else(|_| unreachable!());
        RulePolicy::new("contoso.com", tenant, "sqlauthentication")
    }

    fn rule(connector_type: &str) -> ConnectorRule {
        let connector_type =
            ConnectorTypeIdentifier::normalize(connector_type).unwrap_or_else(|| unreachable!());
        ConnectorRule::for_connector_type(&connector_type)
    }

    fn evaluate(connector_type: &str, details: serde_json::Value) -> RuleVerdict {
        rule(connector_type)
            .evaluate(&ConnectorDetails::new(details), &policy())
            .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn storage_rules_read_type_specific_name_field() {
        assert_eq!(
            evaluate(
                "azureblob",
                json!({"properties": {"nonSecretParameterValues": {"accountName": "AcmeStore"}}})
            ),
            RuleVerdict::RequiresResource {
                kind: ResourceKind::StorageAccount,
                name: "acmestore".to_owned(),
            }
        );
        assert_eq!(
            evaluate(
                "azurequeues",
                json!({"properties": {"nonSecretParameterValues": {"storageaccount": "queues"}}})
            ),
            RuleVerdict::RequiresResource {
                kind: ResourceKind::StorageAccount,
                name: "queues".to_owned(),
            }
        );
    }

    #[test]
    fn connector_types_dispatch_to_their_rules() {
        assert_eq!(rule("azuretables"), ConnectorRule::TableOrQueueStorage);
        assert_eq!(rule("AzureQueues"), ConnectorRule::TableOrQueueStorage);
        assert_eq!(rule("excelonlinebusiness"), ConnectorRule::OrganizationalIdentity);
        assert_eq!(rule("sqldw"), ConnectorRule::SqlDataWarehouse);
        assert_eq!(rule("applicationinsights"), ConnectorRule::ApplicationInsights);
    }

    #[test]
    fn table_storage_reads_storage_account_field() {
        assert_eq!(
            evaluate(
                "azuretables",
                json!({"properties": {"nonSecretParameterValues": {"storageaccount": "AcmeTables"}}})
            ),
            RuleVerdict::RequiresResource {
                kind: ResourceKind::StorageAccount,
                name: "acmetables".to_owned(),
            }
        );
    }

    #[test]
    fn sql_data_warehouse_requires_server_fqdn() {
        assert_eq!(
            evaluate(
                "sqldw",
                json!({"properties": {"nonSecretParameterValues": {"server": "Warehouse.database.windows.net"}}})
            ),
            RuleVerdict::RequiresResource {
                kind: ResourceKind::SqlServer,
                name: "warehouse.database.windows.net".to_owned(),
            }
        );
    }

    #[test]
    fn application_insights_requires_component_app_id() {
        assert_eq!(
            evaluate(
                "applicationinsights",
                json!({"properties": {"nonSecretParameterValues": {"username": "ABC-123"}}})
            ),
            RuleVerdict::RequiresResource {
                kind: ResourceKind::InsightsComponent,
                name: "abc-123".to_owned(),
            }
        );
    }

    #[test]
    fn excel_connector_requires_trusted_user() {
        let verdict = evaluate(
            "excelonlinebusiness",
            json!({"properties": {"authenticatedUser": {"name": "jane@fabrikam.com"}}}),
        );

        assert!(matches!(verdict, RuleVerdict::Violation { .. }));
    }

    #[test]
    fn sql_with_trusted_server_is_exempt() {
        let verdict = evaluate(
            "sql",
            json!({"properties": {"parameterValueSet": {
                "name": "sqlAuthentication",
                "values": {"server": {"value": "reporting.CONTOSO.com"}}
            }}}),
        );

        assert!(matches!(verdict, RuleVerdict::Compliant { .. }));
    }

    #[test]
    fn sql_with_untrusted_server_requires_fqdn_match() {
        let verdict = evaluate(
            "sql",
            json!({"properties": {"parameterValueSet": {
                "name": "sqlAuthentication",
                "values": {"server": {"value": "acme.database.windows.net"}}
            }}}),
        );

        assert_eq!(
            verdict,
            RuleVerdict::RequiresResource {
                kind: ResourceKind::SqlServer,
                name: "acme.database.windows.net".to_owned(),
            }
        );
    }

    #[test]
    fn sql_with_other_auth_mode_is_not_verified() {
        let verdict = evaluate(
            "sql",
            json!({"properties": {"parameterValueSet": {"name": "oauthMI", "values": {}}}}),
        );

        assert!(matches!(verdict, RuleVerdict::Compliant { .. }));
    }

    #[test]
    fn office_connectors_require_trusted_user() {
        let trusted = evaluate(
            "SharePointOnline",
            json!({"properties": {"authenticatedUser": {"name": "Jane@Contoso.com"}}}),
        );
        let untrusted = evaluate(
            "office365",
            json!({"properties": {"authenticatedUser": {"name": "jane@gmail.com"}}}),
        );

        assert!(matches!(trusted, RuleVerdict::Compliant { .. }));
        assert!(matches!(untrusted, RuleVerdict::Violation { .. }));
    }

    #[test]
    fn federated_tenant_checks_user_only_when_present() {
        let user_and_tenant = evaluate(
            "azuredatalake",
            json!({"properties": {
                "authenticatedUser": {"name": "jane@contoso.com"},
                "nonSecretParameterValues": {"token:TenantId": TRUSTED_TENANT.to_uppercase()}
            }}),
        );
        let untrusted_user = evaluate(
            "azuredatalake",
            json!({"properties": {
                "authenticatedUser": {"name": "jane@fabrikam.com"},
                "nonSecretParameterValues": {"token:TenantId": TRUSTED_TENANT}
            }}),
        );
        let service_principal = evaluate(
            "azuredatafactory",
            json!({"properties": {
                "authenticatedUser": {},
                "nonSecretParameterValues": {"token:TenantId": TRUSTED_TENANT}
            }}),
        );
        let foreign_tenant = evaluate(
            "azuredatafactory",
            json!({"properties": {
                "nonSecretParameterValues": {"token:TenantId": "99999999-2222-3333-4444-555555555555"}
            }}),
        );

        assert!(matches!(user_and_tenant, RuleVerdict::Compliant { .. }));
        assert!(matches!(untrusted_user, RuleVerdict::Violation { .. }));
        assert!(matches!(service_principal, RuleVerdict::Compliant { .. }));
        assert!(matches!(foreign_tenant, RuleVerdict::Violation { .. }));
    }

    #[test]
    fn unknown_allow_listed_type_needs_no_details() {
        assert_eq!(rule("twitter"), ConnectorRule::AllowListOnly);
        assert!(matches!(
            evaluate("twitter", json!({})),
            RuleVerdict::Compliant { .. }
        ));
    }

    #[test]
    fn missing_resource_name_is_an_error() {
        let result = rule("documentdb").evaluate(&ConnectorDetails::new(json!({})), &policy());
        assert!(result.is_err());
    }

    #[test]
    fn resource_kinds_compare_their_own_fields() {
        let server = json!({"name": "acme", "properties": {"fullyQualifiedDomainName": "acme.database.windows.net"}});
        let component = json!({"name": "telemetry", "properties": {"AppId": "ABC-123"}});

        assert!(ResourceKind::SqlServer.matches(&server, "ACME.database.windows.net"));
        assert!(!ResourceKind::SqlServer.matches(&server, "acme"));
        assert!(ResourceKind::InsightsComponent.matches(&component, "abc-123"));
        assert!(ResourceKind::StorageAccount.matches(&json!({"name": "AcmeStore"}), "acmestore"));
    }
}
