//! IAM rules: a principal plus the policy documents it must be granted.
//!
//! The four rule variants differ only in which IAM lookup lists the
//! principal's attached policies and in the names used to report on them;
//! [`RuleKind`] carries that table.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidatorError};
use crate::policy::PolicyDocument;

/// API version of the rule resources, part of the rule type name
pub const RULE_API_VERSION: &str = "v1alpha1";

/// Rule for an IAM group
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupRule {
    /// Group name
    pub iam_group_name: String,
    /// Required policy documents
    #[serde(default)]
    pub iam_policies: Vec<PolicyDocument>,
}

/// Rule for an IAM role
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoleRule {
    /// Role name
    pub iam_role_name: String,
    /// Required policy documents
    #[serde(default)]
    pub iam_policies: Vec<PolicyDocument>,
}

/// Rule for an IAM user
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserRule {
    /// User name
    pub iam_user_name: String,
    /// Required policy documents
    #[serde(default)]
    pub iam_policies: Vec<PolicyDocument>,
}

/// Rule for a managed policy itself
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    /// Managed policy ARN
    pub iam_policy_arn: String,
    /// Required policy documents
    #[serde(default)]
    pub iam_policies: Vec<PolicyDocument>,
}

/// Which kind of principal a rule is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// IAM group
    Group,
    /// IAM role
    Role,
    /// IAM user
    User,
    /// Managed policy
    Policy,
}

impl RuleKind {
    /// `validationType` of results for this kind
    #[must_use]
    pub const fn validation_type(self) -> &'static str {
        match self {
            Self::Group => "aws-iam-group-policy",
            Self::Role => "aws-iam-role-policy",
            Self::User => "aws-iam-user-policy",
            Self::Policy => "aws-iam-policy",
        }
    }

    /// Rule resource kind, without the API version
    #[must_use]
    pub const fn resource_kind(self) -> &'static str {
        match self {
            Self::Group => "IamGroupRule",
            Self::Role => "IamRoleRule",
            Self::User => "IamUserRule",
            Self::Policy => "IamPolicyRule",
        }
    }

    /// Name used in missing-action failures, e.g. `v1alpha1.IamRoleRule`
    #[must_use]
    pub fn rule_type_name(self) -> String {
        format!("{RULE_API_VERSION}.{}", self.resource_kind())
    }

    /// Principal kind as written in error messages
    #[must_use]
    pub const fn principal_kind(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Role => "role",
            Self::User => "user",
            Self::Policy => "policy",
        }
    }
}

/// Any of the four rule variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IamRule {
    /// Group rule
    Group(GroupRule),
    /// Role rule
    Role(RoleRule),
    /// User rule
    User(UserRule),
    /// Managed policy rule
    Policy(PolicyRule),
}

impl IamRule {
    /// The kind of principal
    #[must_use]
    pub const fn kind(&self) -> RuleKind {
        match self {
            Self::Group(_) => RuleKind::Group,
            Self::Role(_) => RuleKind::Role,
            Self::User(_) => RuleKind::User,
            Self::Policy(_) => RuleKind::Policy,
        }
    }

    /// Group, role or user name, or policy ARN
    #[must_use]
    pub fn principal(&self) -> &str {
        match self {
            Self::Group(rule) => &rule.iam_group_name,
            Self::Role(rule) => &rule.iam_role_name,
            Self::User(rule) => &rule.iam_user_name,
            Self::Policy(rule) => &rule.iam_policy_arn,
        }
    }

    /// Required policy documents
    #[must_use]
    pub fn policies(&self) -> &[PolicyDocument] {
        match self {
            Self::Group(rule) => &rule.iam_policies,
            Self::Role(rule) => &rule.iam_policies,
            Self::User(rule) => &rule.iam_policies,
            Self::Policy(rule) => &rule.iam_policies,
        }
    }

    /// `validationRule` of this rule's result
    #[must_use]
    pub fn validation_rule(&self) -> String {
        format!("validation-{}", self.principal())
    }

    /// Check the rule invariants: a principal is named and every required
    /// statement lists at least one action and one resource.
    ///
    /// # Errors
    /// Returns [`ValidatorError::InvalidRule`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        let rule = self.validation_rule();
        if self.principal().trim().is_empty() {
            return Err(ValidatorError::invalid_rule(
                rule,
                format!("missing IAM {} identifier", self.kind().principal_kind()),
            ));
        }

        for policy in self.policies() {
            for (index, statement) in policy.statements.iter().enumerate() {
                if statement.actions.is_empty() {
                    return Err(ValidatorError::invalid_rule(
                        rule,
                        format!("statement {index} of policy {} has no actions", policy.name),
                    ));
                }
                if statement.resources.is_empty() {
                    return Err(ValidatorError::invalid_rule(
                        rule,
                        format!("statement {index} of policy {} has no resources", policy.name),
                    ));
                }
            }
        }

        Ok(())
    }
}

impl From<GroupRule> for IamRule {
    fn from(rule: GroupRule) -> Self {
        Self::Group(rule)
    }
}

impl From<RoleRule> for IamRule {
    fn from(rule: RoleRule) -> Self {
        Self::Role(rule)
    }
}

impl From<UserRule> for IamRule {
    fn from(rule: UserRule) -> Self {
        Self::User(rule)
    }
}

impl From<PolicyRule> for IamRule {
    fn from(rule: PolicyRule) -> Self {
        Self::Policy(rule)
    }
}
