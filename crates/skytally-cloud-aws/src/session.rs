//! STS AssumeRole session factory

use crate::regions;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_sdk_sts::error::{DisplayErrorContext, SdkError};
use aws_sdk_sts::operation::assume_role::AssumeRoleError;
use skytally_cloud::{CloudError, CloudSession, Result, SessionFactory};
use skytally_core::AccountRef;
use std::time::SystemTime;

pub const DEFAULT_SESSION_NAME: &str = "skytally";

/// Region-scoped config carrying temporary credentials for one account.
#[derive(Debug, Clone)]
pub struct AwsSession {
    account_id: String,
    region: String,
    config: SdkConfig,
}

impl AwsSession {
    pub fn config(&self) -> &SdkConfig {
        &self.config
    }
}

impl CloudSession for AwsSession {
    fn account_id(&self) -> &str {
        &self.account_id
    }

    fn region(&self) -> &str {
        &self.region
    }
}

/// Assumes each account's role with the caller's default credential chain.
pub struct AwsSessionFactory {
    base: SdkConfig,
    session_name: String,
}

impl AwsSessionFactory {
    /// Load the caller's credentials from the default provider chain.
    pub async fn from_env(home_region: &str, session_name: impl Into<String>) -> Self {
        let base = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(home_region.to_string()))
            .load()
            .await;
        Self::new(base, session_name)
    }

    pub fn new(base: SdkConfig, session_name: impl Into<String>) -> Self {
        Self {
            base,
            session_name: session_name.into(),
        }
    }

    pub fn base_config(&self) -> &SdkConfig {
        &self.base
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    fn regional(&self, region: &str) -> SdkConfig {
        self.base
            .to_builder()
            .region(Region::new(region.to_string()))
            .build()
    }
}

#[async_trait]
impl SessionFactory for AwsSessionFactory {
    type Session = AwsSession;

    fn name(&self) -> &str {
        "aws"
    }

    async fn acquire(&self, account: &AccountRef, region: &str) -> Result<AwsSession> {
        if !regions::is_valid_region_code(region) {
            return Err(CloudError::region(region, "not a valid region code"));
        }

        let regional = self.regional(region);
        let sts = aws_sdk_sts::Client::new(&regional);
        let request = sts
            .assume_role()
            .role_arn(&account.role_arn)
            .role_session_name(&self.session_name)
            .set_external_id(account.external_id.clone());

        let output = request
            .send()
            .await
            .map_err(|e| classify_assume_role_error(account, region, e))?;

        let Some(issued) = output.credentials() else {
            return Err(CloudError::auth(
                &account.account_id,
                "AssumeRole returned no credentials",
            ));
        };

        let credentials = Credentials::new(
            issued.access_key_id(),
            issued.secret_access_key(),
            Some(issued.session_token().to_string()),
            SystemTime::try_from(*issued.expiration()).ok(),
            "skytally-assume-role",
        );

        tracing::debug!(
            account_id = %account.account_id,
            region,
            "role assumed"
        );

        let config = regional
            .to_builder()
            .credentials_provider(SharedCredentialsProvider::new(credentials))
            .build();

        Ok(AwsSession {
            account_id: account.account_id.clone(),
            region: region.to_string(),
            config,
        })
    }
}

/// A disabled region is a region error; every other rejection (trust policy,
/// external ID, expired caller credentials, network) fails authentication.
fn classify_assume_role_error(
    account: &AccountRef,
    region: &str,
    error: SdkError<AssumeRoleError>,
) -> CloudError {
    if error
        .as_service_error()
        .is_some_and(AssumeRoleError::is_region_disabled_exception)
    {
        return CloudError::region(region, DisplayErrorContext(error));
    }
    CloudError::auth(&account.account_id, DisplayErrorContext(error))
}
