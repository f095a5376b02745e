use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_iam::error::DisplayErrorContext;
use aws_sdk_iam::types::AttachedPolicy as SdkAttachedPolicy;
use aws_sdk_iam::Client as IamClient;
use log::{debug, trace};

use crate::aws::{AwsError, AwsResult};
use crate::iam_api::{AttachedPolicy, IamApi, ManagedPolicy, PolicyVersion};

/// Client to call AWS IAM
pub struct AwsIamClient {
    pub(crate) client: IamClient,
}

/// Impl for AWS IAM client wrapper
impl AwsIamClient {
    /// New construct
    #[must_use]
    pub fn new(client: IamClient) -> Self {
        Self { client }
    }

    /// Build a client from the standard credential provider chain
    ///
    /// `region` and `profile` override what the environment and shared
    /// config files select.
    pub async fn from_env(region: Option<String>, profile: Option<String>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        let config = loader.load().await;

        debug!("Loaded AWS configuration, region={:?}", config.region());
        Self::new(IamClient::new(&config))
    }

    fn convert_attached(policies: &[SdkAttachedPolicy]) -> impl Iterator<Item = AttachedPolicy> + '_ {
        policies.iter().filter_map(|p| {
            p.policy_arn().map(|arn| {
                AttachedPolicy::new(arn.to_string(), p.policy_name().unwrap_or_default().to_string())
            })
        })
    }
}

#[async_trait]
impl IamApi for AwsIamClient {
    async fn list_attached_group_policies(&self, group_name: &str) -> AwsResult<Vec<AttachedPolicy>> {
        let mut policies = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let out = self
                .client
                .list_attached_group_policies()
                .group_name(group_name)
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| {
                    AwsError::IamError(format!(
                        "Failed to call ListAttachedGroupPolicies for {group_name}: {}",
                        DisplayErrorContext(&e)
                    ))
                })?;

            policies.extend(Self::convert_attached(out.attached_policies()));

            marker = out.marker().map(ToString::to_string);
            if !out.is_truncated() || marker.is_none() {
                break;
            }
        }

        trace!("Group {} has {} attached policies", group_name, policies.len());
        Ok(policies)
    }

    async fn list_attached_role_policies(&self, role_name: &str) -> AwsResult<Vec<AttachedPolicy>> {
        let mut policies = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let out = self
                .client
                .list_attached_role_policies()
                .role_name(role_name)
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| {
                    AwsError::IamError(format!(
                        "Failed to call ListAttachedRolePolicies for {role_name}: {}",
                        DisplayErrorContext(&e)
                    ))
                })?;

            policies.extend(Self::convert_attached(out.attached_policies()));

            marker = out.marker().map(ToString::to_string);
            if !out.is_truncated() || marker.is_none() {
                break;
            }
        }

        trace!("Role {} has {} attached policies", role_name, policies.len());
        Ok(policies)
    }

    async fn list_attached_user_policies(&self, user_name: &str) -> AwsResult<Vec<AttachedPolicy>> {
        let mut policies = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let out = self
                .client
                .list_attached_user_policies()
                .user_name(user_name)
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| {
                    AwsError::IamError(format!(
                        "Failed to call ListAttachedUserPolicies for {user_name}: {}",
                        DisplayErrorContext(&e)
                    ))
                })?;

            policies.extend(Self::convert_attached(out.attached_policies()));

            marker = out.marker().map(ToString::to_string);
            if !out.is_truncated() || marker.is_none() {
                break;
            }
        }

        trace!("User {} has {} attached policies", user_name, policies.len());
        Ok(policies)
    }

    async fn get_policy(&self, policy_arn: &str) -> AwsResult<Option<ManagedPolicy>> {
        let out = self
            .client
            .get_policy()
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "Failed to call GetPolicy for {policy_arn}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(out.policy().map(|p| {
            ManagedPolicy::new(
                p.arn().unwrap_or(policy_arn).to_string(),
                p.default_version_id().map(ToString::to_string),
            )
        }))
    }

    async fn get_policy_version(
        &self,
        policy_arn: &str,
        version_id: &str,
    ) -> AwsResult<Option<PolicyVersion>> {
        let out = self
            .client
            .get_policy_version()
            .policy_arn(policy_arn)
            .version_id(version_id)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "Failed to call GetPolicyVersion for {policy_arn} {version_id}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(out.policy_version().map(|v| {
            PolicyVersion::new(
                v.version_id().unwrap_or(version_id).to_string(),
                v.document().map(ToString::to_string),
            )
        }))
    }
}
