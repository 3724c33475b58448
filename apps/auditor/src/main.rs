//! Connector compliance auditor for deployed Logic App workflows.

#![forbid(unsafe_code)]

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use connguard_application::{
    ComplianceConfig, ComplianceService, DEFAULT_LOOKUP_TABLE_NAME, DEFAULT_MANAGEMENT_BASE_URL,
    DEFAULT_TRUSTED_SQL_AUTH_MODE, ProjectMetadataService, ProviderApiVersions,
    RemediationJournal,
};
use connguard_core::{AppError, AppResult, TenantId};
use connguard_domain::{ComplianceReport, RemediationReport, RulePolicy};
use connguard_infrastructure::{
    ArmRestClient, HttpLookupStore, HttpProjectMetadataService, InMemoryProjectMetadataService,
    InMemoryRemediationJournal, JsonFileRemediationJournal,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const NON_COMPLIANT_EXIT_CODE: u8 = 2;
const DEFAULT_JOURNAL_PATH: &str = ".connguard-journal.json";

/// Audits Logic App workflow connectors and removes the ones that break policy.
///
/// Configuration is read from the environment (and `.env`).
#[derive(Debug, Parser)]
#[command(name = "connguard-auditor")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum Command {
    /// Print the compliance report; exits 2 when the workflow is not compliant
    Audit {
        /// Full resource id of the workflow
        resource_id: String,
    },
    /// Audit, then delete invalid connections and rewrite the workflow
    Remediate {
        /// Full resource id of the workflow
        resource_id: String,
    },
}

#[derive(Debug, Clone)]
enum ProjectSource {
    Http {
        base_url: String,
        access_token: Option<String>,
    },
    File(PathBuf),
}

#[derive(Debug, Clone)]
struct AuditorConfig {
    arm_base_url: String,
    arm_access_token: String,
    trusted_domain_suffix: String,
    trusted_tenant_id: TenantId,
    trusted_sql_auth_mode: String,
    api_versions: ProviderApiVersions,
    lookup_table_endpoint: String,
    lookup_table_sas: String,
    lookup_table_name: String,
    project_source: ProjectSource,
    http_timeout_seconds: u64,
    scan_timeout_seconds: u64,
    journal_path: Option<PathBuf>,
}

impl AuditorConfig {
    fn load() -> AppResult<Self> {
        let defaults = ProviderApiVersions::default();
        let api_versions = ProviderApiVersions {
            logic_apps: env_or("LOGIC_APPS_API_VERSION", defaults.logic_apps.as_str()),
            document_db: env_or("DOCUMENT_DB_API_VERSION", defaults.document_db.as_str()),
            storage: env_or("STORAGE_API_VERSION", defaults.storage.as_str()),
            sql: env_or("SQL_API_VERSION", defaults.sql.as_str()),
            insights: env_or("INSIGHTS_API_VERSION", defaults.insights.as_str()),
        };

        let project_source = match optional_env("PROJECT_METADATA_FILE") {
            Some(path) => ProjectSource::File(PathBuf::from(path)),
            None => ProjectSource::Http {
                base_url: required_env("PROJECT_METADATA_URL")?,
                access_token: optional_env("PROJECT_METADATA_TOKEN"),
            },
        };

        let journal_path = match env::var("REMEDIATION_JOURNAL_PATH") {
            Ok(value) if value.trim().is_empty() => None,
            Ok(value) => Some(PathBuf::from(value)),
            Err(_) => Some(PathBuf::from(DEFAULT_JOURNAL_PATH)),
        };

        let http_timeout_seconds = require_positive(
            "HTTP_TIMEOUT_SECONDS",
            parse_env_u64("HTTP_TIMEOUT_SECONDS", 30)?,
        )?;
        let scan_timeout_seconds = require_positive(
            "SCAN_TIMEOUT_SECONDS",
            parse_env_u64("SCAN_TIMEOUT_SECONDS", 60)?,
        )?;

        Ok(Self {
            arm_base_url: env_or("ARM_BASE_URL", DEFAULT_MANAGEMENT_BASE_URL),
            arm_access_token: required_env("ARM_ACCESS_TOKEN")?,
            trusted_domain_suffix: required_env("TRUSTED_DOMAIN_SUFFIX")?,
            trusted_tenant_id: required_env("TRUSTED_TENANT_ID")?.parse()?,
            trusted_sql_auth_mode: env_or("TRUSTED_SQL_AUTH_MODE", DEFAULT_TRUSTED_SQL_AUTH_MODE),
            api_versions,
            lookup_table_endpoint: required_env("LOOKUP_TABLE_ENDPOINT")?,
            lookup_table_sas: required_env("LOOKUP_TABLE_SAS")?,
            lookup_table_name: env_or("LOOKUP_TABLE_NAME", DEFAULT_LOOKUP_TABLE_NAME),
            project_source,
            http_timeout_seconds,
            scan_timeout_seconds,
            journal_path,
        })
    }

    fn compliance_config(&self) -> ComplianceConfig {
        let rule_policy = RulePolicy::new(
            self.trusted_domain_suffix.as_str(),
            self.trusted_tenant_id,
            self.trusted_sql_auth_mode.as_str(),
        );

        ComplianceConfig::new(self.arm_base_url.as_str(), rule_policy)
            .with_api_versions(self.api_versions.clone())
            .with_scan_timeout(Duration::from_secs(self.scan_timeout_seconds))
            .with_lookup_table_name(self.lookup_table_name.as_str())
    }
}

#[derive(Debug, Serialize)]
struct RemediationOutput {
    audit: ComplianceReport,
    remediation: RemediationReport,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    dotenvy::dotenv().ok();
    init_tracing();

    match run(cli.command).await {
        Ok(exit_code) => exit_code,
        Err(error) => {
            error!(error = %error, "connguard-auditor failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> AppResult<ExitCode> {
    let config = AuditorConfig::load()?;
    let service = build_compliance_service(&config).await?;

    match command {
        Command::Audit { resource_id } => {
            let report = service.audit(resource_id.as_str()).await?;
            print_json(&report)?;

            Ok(if report.status {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(NON_COMPLIANT_EXIT_CODE)
            })
        }
        Command::Remediate { resource_id } => {
            let audit = service.audit(resource_id.as_str()).await?;
            let remediation = if audit.status {
                info!(resource_id = %resource_id, "workflow compliant, nothing to remediate");
                RemediationReport::default()
            } else {
                service
                    .remediate(resource_id.as_str(), &audit.invalid_connectors)
                    .await?
            };
            print_json(&RemediationOutput { audit, remediation })?;

            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn build_compliance_service(config: &AuditorConfig) -> AppResult<ComplianceService> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_seconds))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    let arm_client = Arc::new(ArmRestClient::new(
        http_client.clone(),
        config.arm_base_url.as_str(),
        config.arm_access_token.as_str(),
        config.api_versions.logic_apps.as_str(),
    ));
    let lookup_store = Arc::new(HttpLookupStore::new(
        http_client.clone(),
        config.lookup_table_endpoint.as_str(),
        config.lookup_table_sas.as_str(),
    ));
    let project_metadata: Arc<dyn ProjectMetadataService> = match &config.project_source {
        ProjectSource::Http {
            base_url,
            access_token,
        } => {
            let service = HttpProjectMetadataService::new(http_client, base_url.as_str());
            Arc::new(match access_token {
                Some(access_token) => service.with_access_token(access_token.as_str()),
                None => service,
            })
        }
        ProjectSource::File(path) => {
            Arc::new(InMemoryProjectMetadataService::from_json_file(path).await?)
        }
    };
    let remediation_journal: Arc<dyn RemediationJournal> = match &config.journal_path {
        Some(path) => Arc::new(JsonFileRemediationJournal::new(path.clone())),
        None => Arc::new(InMemoryRemediationJournal::new()),
    };

    info!(
        arm_base_url = %config.arm_base_url,
        lookup_table = %config.lookup_table_name,
        scan_timeout_seconds = config.scan_timeout_seconds,
        "connguard-auditor configured"
    );

    Ok(ComplianceService::new(
        config.compliance_config(),
        arm_client.clone(),
        arm_client,
        lookup_store,
        project_metadata,
    )
    .with_remediation_journal(remediation_journal))
}

fn print_json(value: &impl Serialize) -> AppResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|error| AppError::Internal(format!("failed to render report: {error}")))?;
    println!("{rendered}");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Configuration(format!("{name} is required")))
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn env_or(name: &str, default: &str) -> String {
    optional_env(name).unwrap_or_else(|| default.to_owned())
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Configuration(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn require_positive(name: &str, value: u64) -> AppResult<u64> {
    if value == 0 {
        return Err(AppError::Configuration(format!(
            "{name} must be greater than zero"
        )));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use connguard_core::AppError;

    use super::{Cli, Command, require_positive};

    #[test]
    fn parses_both_subcommands() {
        let audit = Cli::try_parse_from([
            "connguard-auditor",
            "audit",
            "/subscriptions/s/resourceGroups/rg",
        ]);
        assert!(audit.is_ok_and(|cli| cli.command
            == Command::Audit {
                resource_id: "/subscriptions/s/resourceGroups/rg".to_owned()
            }));

        let remediate = Cli::try_parse_from(["connguard-auditor", "remediate", "id"]);
        assert!(remediate.is_ok_and(|cli| cli.command
            == Command::Remediate {
                resource_id: "id".to_owned()
            }));
    }

    #[test]
    fn rejects_unknown_or_incomplete_invocations() {
        assert!(Cli::try_parse_from(["connguard-auditor"]).is_err());
        assert!(Cli::try_parse_from(["connguard-auditor", "audit"]).is_err());
        assert!(Cli::try_parse_from(["connguard-auditor", "delete", "id"]).is_err());
        assert!(Cli::try_parse_from(["connguard-auditor", "audit", "id", "extra"]).is_err());
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        assert!(matches!(
            require_positive("SCAN_TIMEOUT_SECONDS", 0),
            Err(AppError::Configuration(message)) if message.contains("SCAN_TIMEOUT_SECONDS")
        ));
        assert!(matches!(require_positive("HTTP_TIMEOUT_SECONDS", 30), Ok(30)));
    }
}
