use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::path::Path;

use super::{AttachedPolicy, IamApi, ManagedPolicy, PolicyVersion};
use crate::aws::AwsResult;
use crate::errors::{Result, ValidatorError};
use crate::policy::percent_encode_document;

/// A managed policy inside a snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPolicy {
    /// Version IAM would evaluate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_version_id: Option<String>,
    /// Version id -> document. A JSON object is percent-encoded when served;
    /// a string is served verbatim, as IAM would return it.
    #[serde(default)]
    pub versions: BTreeMap<String, JsonValue>,
}

/// Offline copy of the IAM state rule evaluation reads
///
/// ```json
/// {
///   "roles": { "ci": [{ "arn": "arn:aws:iam::123456789012:policy/ci", "name": "ci" }] },
///   "policies": {
///     "arn:aws:iam::123456789012:policy/ci": {
///       "defaultVersionId": "v1",
///       "versions": { "v1": { "Version": "2012-10-17", "Statement": [] } }
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IamSnapshot {
    /// Group name -> attached policies
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<AttachedPolicy>>,
    /// Role name -> attached policies
    #[serde(default)]
    pub roles: BTreeMap<String, Vec<AttachedPolicy>>,
    /// User name -> attached policies
    #[serde(default)]
    pub users: BTreeMap<String, Vec<AttachedPolicy>>,
    /// Policy ARN -> policy
    #[serde(default)]
    pub policies: BTreeMap<String, SnapshotPolicy>,
}

impl IamSnapshot {
    /// Load a snapshot from a JSON file
    ///
    /// # Errors
    /// Returns [`ValidatorError::FileSystem`] if the file cannot be read and
    /// [`ValidatorError::JsonParsing`] if it is not a valid snapshot.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ValidatorError::file_system("read", path, e))?;
        serde_json::from_str(&content)
            .map_err(|e| ValidatorError::json_parsing(format!("IAM snapshot {}", path.display()), e))
    }

    /// Attach a policy to a group
    #[must_use]
    pub fn with_group_policy(mut self, group: &str, policy: AttachedPolicy) -> Self {
        self.groups.entry(group.to_string()).or_default().push(policy);
        self
    }

    /// Attach a policy to a role
    #[must_use]
    pub fn with_role_policy(mut self, role: &str, policy: AttachedPolicy) -> Self {
        self.roles.entry(role.to_string()).or_default().push(policy);
        self
    }

    /// Attach a policy to a user
    #[must_use]
    pub fn with_user_policy(mut self, user: &str, policy: AttachedPolicy) -> Self {
        self.users.entry(user.to_string()).or_default().push(policy);
        self
    }

    /// Add a policy whose default version is `version_id` with `document`
    #[must_use]
    pub fn with_policy_document(mut self, arn: &str, version_id: &str, document: JsonValue) -> Self {
        let policy = self.policies.entry(arn.to_string()).or_default();
        policy.default_version_id = Some(version_id.to_string());
        policy.versions.insert(version_id.to_string(), document);
        self
    }

    fn attached(map: &BTreeMap<String, Vec<AttachedPolicy>>, name: &str) -> Vec<AttachedPolicy> {
        map.get(name).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl IamApi for IamSnapshot {
    async fn list_attached_group_policies(&self, group_name: &str) -> AwsResult<Vec<AttachedPolicy>> {
        Ok(Self::attached(&self.groups, group_name))
    }

    async fn list_attached_role_policies(&self, role_name: &str) -> AwsResult<Vec<AttachedPolicy>> {
        Ok(Self::attached(&self.roles, role_name))
    }

    async fn list_attached_user_policies(&self, user_name: &str) -> AwsResult<Vec<AttachedPolicy>> {
        Ok(Self::attached(&self.users, user_name))
    }

    async fn get_policy(&self, policy_arn: &str) -> AwsResult<Option<ManagedPolicy>> {
        Ok(self
            .policies
            .get(policy_arn)
            .map(|p| ManagedPolicy::new(policy_arn.to_string(), p.default_version_id.clone())))
    }

    async fn get_policy_version(
        &self,
        policy_arn: &str,
        version_id: &str,
    ) -> AwsResult<Option<PolicyVersion>> {
        let document = self
            .policies
            .get(policy_arn)
            .and_then(|p| p.versions.get(version_id))
            .map(|document| match document {
                JsonValue::String(served) => served.clone(),
                other => percent_encode_document(&other.to_string()),
            });

        Ok(document.map(|d| PolicyVersion::new(version_id.to_string(), Some(d))))
    }
}
