//! This crate provides the core logic of the IAM permission validator:
//! - IAM wildcard matching for actions and resources
//! - Decoding of managed policy documents as IAM returns them
//! - Coverage of required policy documents by granted statements
//! - Rule evaluation for groups, roles, users and managed policies
//!

pub mod aws;
pub mod condition;
pub mod config;
pub mod coverage;
mod errors;
pub mod evaluator;
pub mod iam_api;
pub mod pattern;
pub mod policy;
pub mod rules;
pub mod validation;

// Re-exports for a small, focused public API
pub use aws::iam_client::AwsIamClient;
pub use aws::{AwsError, AwsResult};
pub use condition::covers;
pub use config::RulesFile;
pub use coverage::{GrantSet, Missing};
pub use errors::{Result, ValidatorError};
pub use evaluator::{IamRuleService, RuleOutcome};
pub use iam_api::{AttachedPolicy, IamApi, IamSnapshot, ManagedPolicy, PolicyVersion};
pub use pattern::{matches, Pattern};
pub use policy::{
    decode_policy_document, encode_policy_document, Condition, Effect, GrantedPolicy,
    GrantedStatement, PolicyDocument, StatementEntry,
};
pub use rules::{GroupRule, IamRule, PolicyRule, RoleRule, RuleKind, UserRule};
pub use validation::{ConditionStatus, ValidationCondition, ValidationResult, ValidationState};
