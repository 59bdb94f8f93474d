use serde::{Deserialize, Serialize};

/// An account identifier plus the role to assume into it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountRef {
    pub account_id: String,

    pub role_arn: String,

    /// External ID required by cross-account trust policies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

impl AccountRef {
    pub fn new(account_id: impl Into<String>, role_arn: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            role_arn: role_arn.into(),
            external_id: None,
        }
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }
}

impl std::fmt::Display for AccountRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.account_id, self.role_arn)
    }
}
