//! Collection error types

use skytally_core::ServiceKind;
use thiserror::Error;

/// Errors fatal to a single collection unit.
///
/// The scheduler never propagates these past its boundary; they are captured
/// per unit and reported in the run summary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CloudError {
    /// Role assumption rejected (trust policy, expired caller credentials,
    /// external ID mismatch).
    #[error("Authentication failed for account {account_id}: {cause}")]
    Auth { account_id: String, cause: String },

    /// Region invalid or disabled for the account.
    #[error("Invalid region {region}: {cause}")]
    Region { region: String, cause: String },

    /// Provider API failure while paging through a service's inventory.
    #[error("Collection failed for {service} in {account_id}/{region}: {cause}")]
    Collection {
        service: ServiceKind,
        account_id: String,
        region: String,
        cause: String,
    },
}

impl CloudError {
    pub fn auth(account_id: impl Into<String>, cause: impl ToString) -> Self {
        CloudError::Auth {
            account_id: account_id.into(),
            cause: cause.to_string(),
        }
    }

    pub fn region(region: impl Into<String>, cause: impl ToString) -> Self {
        CloudError::Region {
            region: region.into(),
            cause: cause.to_string(),
        }
    }

    pub fn collection(
        service: ServiceKind,
        account_id: impl Into<String>,
        region: impl Into<String>,
        cause: impl ToString,
    ) -> Self {
        CloudError::Collection {
            service,
            account_id: account_id.into(),
            region: region.into(),
            cause: cause.to_string(),
        }
    }

    /// Short label for summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            CloudError::Auth { .. } => "auth",
            CloudError::Region { .. } => "region",
            CloudError::Collection { .. } => "collection",
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
