//! Rules file loading
//!
//! A rules file lists IAM rules by principal kind, plus an optional default
//! region for live IAM lookups:
//!
//! ```json
//! {
//!   "defaultRegion": "us-east-1",
//!   "iamRoleRules": [{ "iamRoleName": "ci", "iamPolicies": [] }]
//! }
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{Result, ValidatorError};
use crate::rules::{GroupRule, IamRule, PolicyRule, RoleRule, UserRule};

/// Contents of a rules file
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RulesFile {
    /// Region used for IAM calls when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_region: Option<String>,
    /// Rules for IAM groups
    #[serde(default)]
    pub iam_group_rules: Vec<GroupRule>,
    /// Rules for IAM roles
    #[serde(default)]
    pub iam_role_rules: Vec<RoleRule>,
    /// Rules for IAM users
    #[serde(default)]
    pub iam_user_rules: Vec<UserRule>,
    /// Rules for managed policies
    #[serde(default)]
    pub iam_policy_rules: Vec<PolicyRule>,
}

impl RulesFile {
    /// Read, parse and validate a rules file
    ///
    /// # Errors
    /// Returns [`ValidatorError::FileSystem`] if the file cannot be read,
    /// [`ValidatorError::JsonParsing`] if it is not a rules file, and
    /// [`ValidatorError::InvalidRule`] for the first rule that breaks the rule
    /// invariants.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ValidatorError::file_system("read", path, e))?;
        Self::parse(&content).map_err(|e| match e {
            ValidatorError::JsonParsing { source, .. } => {
                ValidatorError::json_parsing(format!("rules file {}", path.display()), source)
            }
            other => other,
        })
    }

    /// Parse and validate rules from a JSON string
    ///
    /// # Errors
    /// Returns [`ValidatorError::JsonParsing`] for invalid JSON and
    /// [`ValidatorError::InvalidRule`] for an invalid rule.
    pub fn parse(content: &str) -> Result<Self> {
        let file: Self = serde_json::from_str(content)
            .map_err(|e| ValidatorError::json_parsing("rules file", e))?;
        file.validate()?;
        Ok(file)
    }

    /// Check every rule
    ///
    /// # Errors
    /// Returns the first [`ValidatorError::InvalidRule`] found.
    pub fn validate(&self) -> Result<()> {
        self.rules().iter().try_for_each(IamRule::validate)
    }

    /// All rules, groups first, then roles, users and policies
    #[must_use]
    pub fn rules(&self) -> Vec<IamRule> {
        self.iam_group_rules
            .iter()
            .cloned()
            .map(IamRule::from)
            .chain(self.iam_role_rules.iter().cloned().map(IamRule::from))
            .chain(self.iam_user_rules.iter().cloned().map(IamRule::from))
            .chain(self.iam_policy_rules.iter().cloned().map(IamRule::from))
            .collect()
    }

    /// Whether the file holds no rules
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iam_group_rules.is_empty()
            && self.iam_role_rules.is_empty()
            && self.iam_user_rules.is_empty()
            && self.iam_policy_rules.is_empty()
    }
}
