//! Rule evaluation
//!
//! For one rule: list the principal's attached managed policies, fetch and
//! decode the default version of each, then check every required policy
//! document against the union of their statements and record what is missing
//! on a [`ValidationResult`].

use log::{debug, info, warn};

use crate::coverage::GrantSet;
use crate::errors::ValidatorError;
use crate::iam_api::{AttachedPolicy, IamApi};
use crate::policy::decode_policy_document;
use crate::rules::{GroupRule, IamRule, PolicyRule, RoleRule, RuleKind, UserRule};
use crate::validation::ValidationResult;


/// Result of reconciling one rule
///
/// `error` is a companion to the result, not a replacement for it: when IAM
/// cannot be queried, or the principal has no attached policies, the result
/// is still emitted (success-shaped) and the error is carried alongside.
#[derive(Debug)]
pub struct RuleOutcome {
    /// The validation result
    pub result: ValidationResult,
    /// Structural error met while evaluating, if any
    pub error: Option<ValidatorError>,
}

/// Evaluates IAM rules through an [`IamApi`]
///
/// Holds no state between rules, so one service can evaluate many rules
/// concurrently.
pub struct IamRuleService<C> {
    api: C,
}

impl<C: IamApi> IamRuleService<C> {
    /// Create a service over an IAM facade
    pub const fn new(api: C) -> Self {
        Self { api }
    }

    /// The underlying facade
    pub const fn api(&self) -> &C {
        &self.api
    }

    /// Reconcile a group rule
    pub async fn reconcile_group_rule(&self, rule: &GroupRule) -> RuleOutcome {
        self.reconcile(&IamRule::Group(rule.clone())).await
    }

    /// Reconcile a role rule
    pub async fn reconcile_role_rule(&self, rule: &RoleRule) -> RuleOutcome {
        self.reconcile(&IamRule::Role(rule.clone())).await
    }

    /// Reconcile a user rule
    pub async fn reconcile_user_rule(&self, rule: &UserRule) -> RuleOutcome {
        self.reconcile(&IamRule::User(rule.clone())).await
    }

    /// Reconcile a managed policy rule
    pub async fn reconcile_policy_rule(&self, rule: &PolicyRule) -> RuleOutcome {
        self.reconcile(&IamRule::Policy(rule.clone())).await
    }

    /// Reconcile any rule
    pub async fn reconcile(&self, rule: &IamRule) -> RuleOutcome {
        let mut result = ValidationResult::new(rule);

        let error = match self.collect_grants(rule, &mut result).await {
            Ok(grants) => {
                Self::record_missing(rule, &grants, &mut result);
                None
            }
            Err(e) => {
                warn!("{}: {}", rule.validation_rule(), e);
                Some(e)
            }
        };

        info!(
            "{} {:?}: {} failure(s), {} detail(s)",
            rule.validation_rule(),
            result.state,
            result.condition.failures.len(),
            result.condition.details.len()
        );
        RuleOutcome { result, error }
    }

    async fn attached_policies(&self, rule: &IamRule) -> Result<Vec<AttachedPolicy>, ValidatorError> {
        let principal = rule.principal();
        let attached = match rule.kind() {
            RuleKind::Group => self
                .api
                .list_attached_group_policies(principal)
                .await
                .map_err(|e| ValidatorError::transport("ListAttachedGroupPolicies", e))?,
            RuleKind::Role => self
                .api
                .list_attached_role_policies(principal)
                .await
                .map_err(|e| ValidatorError::transport("ListAttachedRolePolicies", e))?,
            RuleKind::User => self
                .api
                .list_attached_user_policies(principal)
                .await
                .map_err(|e| ValidatorError::transport("ListAttachedUserPolicies", e))?,
            // the policy is its own subject
            RuleKind::Policy => vec![AttachedPolicy::new(
                principal.to_string(),
                principal.to_string(),
            )],
        };

        if attached.is_empty() {
            return Err(ValidatorError::no_policies_attached(
                rule.kind().principal_kind(),
                principal,
            ));
        }
        Ok(attached)
    }

    async fn collect_grants(
        &self,
        rule: &IamRule,
        result: &mut ValidationResult,
    ) -> Result<GrantSet, ValidatorError> {
        let attached = self.attached_policies(rule).await?;
        debug!(
            "{} has {} attached policies",
            rule.principal(),
            attached.len()
        );

        let mut grants = GrantSet::new();
        for policy in &attached {
            let Some(document) = self.default_document(&policy.arn).await? else {
                debug!("No policy document available for {}", policy.arn);
                continue;
            };

            let added = decode_policy_document(&policy.arn, &document)
                .and_then(|decoded| grants.add_policy(&policy.arn, &decoded));
            if let Err(e) = added {
                warn!("Skipping policy {}: {}", policy.arn, e);
                result.add_detail(e.to_string());
            }
        }

        Ok(grants)
    }

    async fn default_document(&self, policy_arn: &str) -> Result<Option<String>, ValidatorError> {
        let policy = self
            .api
            .get_policy(policy_arn)
            .await
            .map_err(|e| ValidatorError::transport("GetPolicy", e))?;
        let Some(version_id) = policy.and_then(|p| p.default_version_id) else {
            return Ok(None);
        };

        let version = self
            .api
            .get_policy_version(policy_arn, &version_id)
            .await
            .map_err(|e| ValidatorError::transport("GetPolicyVersion", e))?;
        Ok(version.and_then(|v| v.document))
    }

    fn record_missing(rule: &IamRule, grants: &GrantSet, result: &mut ValidationResult) {
        let rule_type_name = rule.kind().rule_type_name();
        for policy in rule.policies() {
            for missing in grants.missing_for_policy(policy) {
                result.add_failure(missing.describe(&rule_type_name, rule.principal()));
            }
        }
    }
}
