//! The IAM facade: the narrow set of IAM lookups rule evaluation needs.
//!
//! The evaluator only talks to IAM through [`IamApi`]. [`crate::aws::iam_client::AwsIamClient`]
//! implements it over the AWS SDK and [`IamSnapshot`] implements it by table
//! lookup for offline use and tests.

use async_trait::async_trait;
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::aws::AwsResult;

/// In-memory facade backed by a JSON snapshot
pub mod snapshot;

pub use snapshot::IamSnapshot;

/// A managed policy attached to a group, role or user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, new)]
pub struct AttachedPolicy {
    /// Policy ARN
    pub arn: String,
    /// Policy name
    pub name: String,
}

/// Metadata of a managed policy
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct ManagedPolicy {
    /// Policy ARN
    pub arn: String,
    /// Version evaluated by IAM
    pub default_version_id: Option<String>,
}

/// One version of a managed policy
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct PolicyVersion {
    /// Version identifier, e.g. "v3"
    pub version_id: String,
    /// Percent-encoded JSON policy document
    pub document: Option<String>,
}

/// IAM lookups used by rule evaluation
///
/// `Ok(None)` and empty lists mean "no data" and are not errors.
#[async_trait]
pub trait IamApi: Send + Sync {
    /// Managed policies attached to an IAM group
    async fn list_attached_group_policies(&self, group_name: &str) -> AwsResult<Vec<AttachedPolicy>>;

    /// Managed policies attached to an IAM role
    async fn list_attached_role_policies(&self, role_name: &str) -> AwsResult<Vec<AttachedPolicy>>;

    /// Managed policies attached to an IAM user
    async fn list_attached_user_policies(&self, user_name: &str) -> AwsResult<Vec<AttachedPolicy>>;

    /// Metadata of a managed policy
    async fn get_policy(&self, policy_arn: &str) -> AwsResult<Option<ManagedPolicy>>;

    /// A specific version of a managed policy
    async fn get_policy_version(
        &self,
        policy_arn: &str,
        version_id: &str,
    ) -> AwsResult<Option<PolicyVersion>>;
}
