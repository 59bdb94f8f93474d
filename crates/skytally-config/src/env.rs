//! Environment variable overrides
//!
//! Variables win over the file. `AWS_ACCOUNTS` replaces the account list;
//! `AWS_ACCOUNT_ID` + `AWS_ROLE_ARN` only apply when no accounts remain.

use crate::error::{ConfigError, Result};
use crate::inventory::InventoryConfig;
use skytally_core::AccountRef;

pub const AWS_ACCOUNTS: &str = "AWS_ACCOUNTS";
pub const AWS_ACCOUNT_ID: &str = "AWS_ACCOUNT_ID";
pub const AWS_ROLE_ARN: &str = "AWS_ROLE_ARN";
pub const AWS_EXTERNAL_ID: &str = "AWS_EXTERNAL_ID";
pub const AWS_SESSION_NAME: &str = "AWS_SESSION_NAME";
pub const AWS_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";
pub const AWS_SERVICES: &str = "AWS_SERVICES";
pub const GOOGLE_SHEETS_ID: &str = "GOOGLE_SHEETS_ID";
pub const SKYTALLY_CONCURRENCY: &str = "SKYTALLY_CONCURRENCY";

/// Parse `id:arn,id:arn`. Each entry splits on its first `:`, since the ARN
/// itself contains colons.
pub fn parse_accounts(value: &str) -> Result<Vec<AccountRef>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (id, arn) = entry
                .split_once(':')
                .map(|(id, arn)| (id.trim(), arn.trim()))
                .filter(|(id, arn)| !id.is_empty() && !arn.is_empty())
                .ok_or_else(|| ConfigError::InvalidValue {
                    name: AWS_ACCOUNTS.to_string(),
                    message: format!("'{}' is not <account_id>:<role_arn>", entry),
                })?;
            Ok(AccountRef::new(id, arn))
        })
        .collect()
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl InventoryConfig {
    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`. Empty values count as unset.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(accounts) = var(AWS_ACCOUNTS) {
            self.accounts = parse_accounts(&accounts)?;
            tracing::debug!(accounts = self.accounts.len(), "accounts from {}", AWS_ACCOUNTS);
        }
        if self.accounts.is_empty() {
            if let (Some(id), Some(arn)) = (var(AWS_ACCOUNT_ID), var(AWS_ROLE_ARN)) {
                self.accounts.push(AccountRef::new(id.trim(), arn.trim()));
            }
        }
        if let Some(external_id) = var(AWS_EXTERNAL_ID) {
            for account in self.accounts.iter_mut().filter(|a| a.external_id.is_none()) {
                account.external_id = Some(external_id.clone());
            }
        }

        if let Some(name) = var(AWS_SESSION_NAME) {
            self.session_name = name;
        }
        if let Some(region) = var(AWS_DEFAULT_REGION) {
            self.default_region = region.trim().to_string();
        }
        if let Some(services) = var(AWS_SERVICES) {
            self.services = split_list(&services);
        }
        if let Some(id) = var(GOOGLE_SHEETS_ID) {
            self.spreadsheet_id = Some(id.trim().to_string());
        }
        if let Some(value) = var(SKYTALLY_CONCURRENCY) {
            self.concurrency = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: SKYTALLY_CONCURRENCY.to_string(),
                message: format!("'{}' is not a positive integer", value),
            })?;
        }

        Ok(())
    }
}
