//! IAM policy document model
//!
//! Two shapes live here. [`PolicyDocument`] is the *required* side: what a rule
//! declares a principal must be allowed to do. [`GrantedPolicy`] is the
//! *granted* side: a managed policy version as IAM returns it, decoded with the
//! tolerance the IAM JSON grammar needs (scalar-or-list fields, single
//! statement objects, multi-key condition blocks).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub(crate) mod decode;
mod serde_helpers;

pub use decode::{decode_policy_document, encode_policy_document, percent_encode_document};

/// Effect of an IAM policy statement
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub enum Effect {
    /// Allow access
    Allow,
    /// Deny access
    Deny,
}

/// A single required condition: one comparator over one key
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Comparator, e.g. `StringEquals` or `ForAnyValue:StringLike`
    #[serde(rename = "type")]
    pub condition_type: String,
    /// Condition key, e.g. `kms:ResourceAliases`
    pub key: String,
    /// Values that must all be present in the granted condition
    pub values: Vec<String>,
}

/// One required statement
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatementEntry {
    /// Optional condition the grant must apply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    /// Statement effect
    pub effect: Effect,
    /// Required actions
    pub actions: Vec<String>,
    /// Required resources
    pub resources: Vec<String>,
}

/// A named set of required statements
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDocument {
    /// Logical policy name, used in failure messages
    pub name: String,
    /// IAM policy language version
    pub version: String,
    /// Required statements
    pub statements: Vec<StatementEntry>,
}

/// Granted condition block: comparator -> key -> values
pub type ConditionMap = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// One statement of a granted managed policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GrantedStatement {
    /// Statement effect
    #[serde(rename = "Effect")]
    pub effect: Effect,
    /// Action patterns
    #[serde(rename = "Action", deserialize_with = "serde_helpers::one_or_many")]
    pub actions: Vec<String>,
    /// Resource patterns
    #[serde(rename = "Resource", deserialize_with = "serde_helpers::one_or_many")]
    pub resources: Vec<String>,
    /// Condition block; an empty block decodes as `None`
    #[serde(
        rename = "Condition",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "serde_helpers::condition_map"
    )]
    pub condition: Option<ConditionMap>,
}

/// A decoded managed policy version
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GrantedPolicy {
    /// Policy language version
    #[serde(rename = "Version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Policy statements
    #[serde(rename = "Statement", deserialize_with = "serde_helpers::one_or_many")]
    pub statements: Vec<GrantedStatement>,
}

impl StatementEntry {
    /// Create a required Allow statement without a condition
    #[must_use]
    pub fn allow(actions: Vec<String>, resources: Vec<String>) -> Self {
        Self {
            condition: None,
            effect: Effect::Allow,
            actions,
            resources,
        }
    }

    /// Set the required condition
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }
}

impl GrantedStatement {
    /// Create a granted statement without a condition
    #[must_use]
    pub fn new(effect: Effect, actions: Vec<String>, resources: Vec<String>) -> Self {
        Self {
            effect,
            actions,
            resources,
            condition: None,
        }
    }

    /// Set the condition block
    #[must_use]
    pub fn with_condition(mut self, condition: ConditionMap) -> Self {
        self.condition = Some(condition);
        self
    }
}
