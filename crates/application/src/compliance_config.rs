use std::time::Duration;

use connguard_domain::{ResourceKind, RulePolicy};

/// Management endpoint used when none is configured.
pub const DEFAULT_MANAGEMENT_BASE_URL: &str = "https://management.azure.com";

/// Lookup table holding the global allow-list record.
pub const DEFAULT_LOOKUP_TABLE_NAME: &str = "Lookup";

/// Authentication mode under which `sql` connections are verified.
pub const DEFAULT_TRUSTED_SQL_AUTH_MODE: &str = "sqlauthentication";

/// API versions pinned per provider resource collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderApiVersions {
    /// Workflows and connections.
    pub logic_apps: String,
    /// Document database accounts.
    pub document_db: String,
    /// Storage accounts.
    pub storage: String,
    /// SQL servers.
    pub sql: String,
    /// Telemetry components.
    pub insights: String,
}

impl ProviderApiVersions {
    /// Returns the API version used to list one resource kind.
    #[must_use]
    pub fn for_kind(&self, kind: ResourceKind) -> &str {
        match kind {
            ResourceKind::DocumentDbAccount => self.document_db.as_str(),
            ResourceKind::StorageAccount => self.storage.as_str(),
            ResourceKind::SqlServer => self.sql.as_str(),
            ResourceKind::InsightsComponent => self.insights.as_str(),
        }
    }
}

impl Default for ProviderApiVersions {
    fn default() -> Self {
        Self {
            logic_apps: "2016-06-01".to_owned(),
            document_db: "2020-04-01".to_owned(),
            storage: "2019-06-01".to_owned(),
            sql: "2019-06-01-preview".to_owned(),
            insights: "2015-05-01".to_owned(),
        }
    }
}

/// Configuration injected into the compliance engine.
#[derive(Debug, Clone)]
pub struct ComplianceConfig {
    management_base_url: String,
    lookup_table_name: String,
    rule_policy: RulePolicy,
    api_versions: ProviderApiVersions,
    scan_timeout: Duration,
}

impl ComplianceConfig {
    /// Creates a configuration with default API versions and a 60 second scan timeout.
    #[must_use]
    pub fn new(management_base_url: impl Into<String>, rule_policy: RulePolicy) -> Self {
        Self {
            management_base_url: management_base_url.into().trim_end_matches('/').to_owned(),
            lookup_table_name: DEFAULT_LOOKUP_TABLE_NAME.to_owned(),
            rule_policy,
            api_versions: ProviderApiVersions::default(),
            scan_timeout: Duration::from_secs(60),
        }
    }

    /// Overrides the pinned API versions.
    #[must_use]
    pub fn with_api_versions(mut self, api_versions: ProviderApiVersions) -> Self {
        self.api_versions = api_versions;
        self
    }

    /// Overrides the per-listing timeout of existence checks.
    #[must_use]
    pub fn with_scan_timeout(mut self, scan_timeout: Duration) -> Self {
        self.scan_timeout = scan_timeout;
        self
    }

    /// Overrides the lookup table holding the global allow-list.
    #[must_use]
    pub fn with_lookup_table_name(mut self, lookup_table_name: impl Into<String>) -> Self {
        self.lookup_table_name = lookup_table_name.into();
        self
    }

    /// Returns the rule policy.
    #[must_use]
    pub fn rule_policy(&self) -> &RulePolicy {
        &self.rule_policy
    }

    /// Returns the pinned API versions.
    #[must_use]
    pub fn api_versions(&self) -> &ProviderApiVersions {
        &self.api_versions
    }

    /// Returns the per-listing timeout.
    #[must_use]
    pub fn scan_timeout(&self) -> Duration {
        self.scan_timeout
    }

    /// Returns the lookup table name.
    #[must_use]
    pub fn lookup_table_name(&self) -> &str {
        self.lookup_table_name.as_str()
    }

    /// Joins a resource path or connection id onto the management endpoint.
    #[must_use]
    pub fn management_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.management_base_url,
            path.trim_start_matches('/')
        )
    }

    /// Builds the listing URL of one resource kind inside a resource group.
    #[must_use]
    pub fn resource_listing_url(
        &self,
        subscription_id: &str,
        resource_group: &str,
        kind: ResourceKind,
    ) -> String {
        self.management_url(
            format!(
                "subscriptions/{subscription_id}/resourceGroups/{resource_group}/providers/{}",
                kind.provider_path()
            )
            .as_str(),
        )
    }
}
