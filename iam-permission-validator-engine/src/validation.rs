//! Validation results
//!
//! A [`ValidationResult`] starts out successful and flips to failed on the
//! first recorded failure. `status`, `state` and `message` always change
//! together.

use serde::{Deserialize, Serialize};

use crate::rules::IamRule;

/// Message of a failed result
pub const FAILURE_MESSAGE: &str =
    "One or more required IAM permissions was not found, or a condition was not met";

/// Status of a validation condition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConditionStatus {
    /// Validation passed
    True,
    /// Validation failed
    False,
}

/// Overall state of a validation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ValidationState {
    /// Validation passed
    Succeeded,
    /// Validation failed
    Failed,
}

/// Outcome of validating one rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationCondition {
    /// e.g. `aws-iam-role-policy`
    pub validation_type: String,
    /// `validation-<principal>`
    pub validation_rule: String,
    /// Human-readable summary
    pub message: String,
    /// Problems that did not stop evaluation, such as undecodable documents
    pub details: Vec<String>,
    /// One entry per missing action set or unmet condition
    pub failures: Vec<String>,
    /// `True` on success
    pub status: ConditionStatus,
}

/// Result of one rule evaluation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// The validation condition
    pub condition: ValidationCondition,
    /// Overall state, matching `condition.status`
    pub state: ValidationState,
}

impl ValidationResult {
    /// A successful result for `rule`
    #[must_use]
    pub fn new(rule: &IamRule) -> Self {
        let validation_type = rule.kind().validation_type();
        Self {
            condition: ValidationCondition {
                validation_type: validation_type.to_string(),
                validation_rule: rule.validation_rule(),
                message: format!("All required {validation_type} permissions were found"),
                details: Vec::new(),
                failures: Vec::new(),
                status: ConditionStatus::True,
            },
            state: ValidationState::Succeeded,
        }
    }

    /// Record a detail; does not change the status
    pub fn add_detail(&mut self, detail: impl Into<String>) {
        self.condition.details.push(detail.into());
    }

    /// Record a failure and mark the result failed
    pub fn add_failure(&mut self, failure: impl Into<String>) {
        self.condition.failures.push(failure.into());
        self.condition.message = FAILURE_MESSAGE.to_string();
        self.condition.status = ConditionStatus::False;
        self.state = ValidationState::Failed;
    }

    /// Whether the rule passed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.state == ValidationState::Succeeded
    }
}
