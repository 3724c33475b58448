use connguard_core::{AppError, AppResult};
use connguard_domain::{
    AllowList, BindingFinding, ComplianceReport, ConnectorBinding, ConnectorDetails,
    ConnectorRule, FindingVerdict, ProjectContext, ResourceId, RuleVerdict,
};
use tracing::{info, warn};

use crate::resource_existence_verifier::InventoryCache;

use super::ComplianceService;

impl ComplianceService {
    /// Audits every connector binding of a workflow.
    ///
    /// Connection details that cannot be read leave the binding valid;
    /// any other failure aborts the audit without a partial report.
    pub async fn audit(&self, resource_id: &str) -> AppResult<ComplianceReport> {
        let resource_id = ResourceId::parse(resource_id)?;
        let workflow = self
            .workflow_store
            .get_workflow(&resource_id)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to read workflow '{resource_id}': {error}"))
            })?;

        if !workflow.has_connections() {
            info!(resource_id = %resource_id, "workflow declares no connectors");
            return Ok(ComplianceReport::compliant_without_connectors(
                resource_id.as_str(),
            ));
        }

        let project_id = resource_id.project_id();
        let project = self
            .project_metadata
            .get_project_info(project_id.as_str())
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to load project '{project_id}' for workflow '{resource_id}': {error}"
                ))
            })?;
        let allow_list = self.allow_list_resolver.resolve_for_project(&project).await?;

        let bindings = workflow.connector_bindings()?;
        let mut cache = InventoryCache::new();
        let mut findings = Vec::with_capacity(bindings.len());
        for binding in bindings {
            let finding = self
                .classify_binding(&project, &allow_list, binding, &mut cache)
                .await?;
            if finding.verdict == FindingVerdict::Invalid {
                warn!(
                    resource_id = %resource_id,
                    alias = %finding.alias,
                    connection_id = %finding.connection_id,
                    reason = %finding.reason,
                    "invalid connector binding"
                );
            }
            findings.push(finding);
        }

        let report = ComplianceReport::from_findings(resource_id.as_str(), findings);
        info!(
            resource_id = %resource_id,
            status = report.status,
            bindings = report.findings.len(),
            invalid = report.invalid_connectors.len(),
            "connector audit completed"
        );

        Ok(report)
    }

    async fn classify_binding(
        &self,
        project: &ProjectContext,
        allow_list: &AllowList,
        binding: ConnectorBinding,
        cache: &mut InventoryCache,
    ) -> AppResult<BindingFinding> {
        let connector_type = binding.connector_type()?;
        let finding = |verdict: FindingVerdict, reason: String| BindingFinding {
            alias: binding.alias.clone(),
            connection_id: binding.connection_id.clone(),
            connector_type: connector_type.to_string(),
            verdict,
            reason,
        };

        if !allow_list.contains(&connector_type) {
            return Ok(finding(
                FindingVerdict::Invalid,
                format!("connector type '{connector_type}' is not allowed"),
            ));
        }

        let details_url = self.config.management_url(binding.connection_id.as_str());
        let details = match self
            .provider
            .get_json(
                details_url.as_str(),
                self.config.api_versions().logic_apps.as_str(),
            )
            .await
        {
            Ok(document) => ConnectorDetails::new(document),
            Err(error) => {
                let error = AppError::LookupFailure(format!(
                    "failed to read connection '{}': {error}",
                    binding.connection_id
                ));
                warn!(
                    alias = %binding.alias,
                    connection_id = %binding.connection_id,
                    error = %error,
                    "skipping connector verification"
                );
                return Ok(finding(FindingVerdict::Skipped, error.to_string()));
            }
        };

        let rule = ConnectorRule::for_connector_type(&connector_type);
        let verdict = rule
            .evaluate(&details, self.config.rule_policy())
            .map_err(|error| {
                AppError::Validation(format!(
                    "connection '{}' cannot be verified: {error}",
                    binding.connection_id
                ))
            })?;

        let finding = match verdict {
            RuleVerdict::Compliant { reason } => finding(FindingVerdict::Valid, reason),
            RuleVerdict::Violation { reason } => finding(FindingVerdict::Invalid, reason),
            RuleVerdict::RequiresResource { kind, name } => {
                if self
                    .verifier
                    .exists_cached(project, kind, name.as_str(), cache)
                    .await?
                {
                    finding(
                        FindingVerdict::Valid,
                        format!("{kind} '{name}' exists in project '{}'", project.project_id),
                    )
                } else {
                    finding(
                        FindingVerdict::Invalid,
                        format!(
                            "{kind} '{name}' does not exist in project '{}'",
                            project.project_id
                        ),
                    )
                }
            }
        };

        Ok(finding)
    }
}
