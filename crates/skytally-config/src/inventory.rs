//! Inventory run configuration

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use skytally_cloud::Selection;
use skytally_core::{AccountRef, ServiceKind};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_REGION: &str = "ap-northeast-2";
pub const DEFAULT_SESSION_NAME: &str = "skytally";
pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_UNIT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryConfig {
    #[serde(default)]
    pub accounts: Vec<AccountRef>,

    #[serde(default = "default_region")]
    pub default_region: String,

    /// Absent means the full region catalogue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<String>>,

    #[serde(default = "default_services")]
    pub services: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_id: Option<String>,

    #[serde(default = "default_session_name")]
    pub session_name: String,

    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_unit_timeout_secs")]
    pub unit_timeout_secs: u64,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_services() -> Vec<String> {
    ServiceKind::ALL.iter().map(|s| s.as_str().to_string()).collect()
}

fn default_session_name() -> String {
    DEFAULT_SESSION_NAME.to_string()
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_unit_timeout_secs() -> u64 {
    DEFAULT_UNIT_TIMEOUT_SECS
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            default_region: default_region(),
            regions: None,
            services: default_services(),
            spreadsheet_id: None,
            session_name: default_session_name(),
            concurrency: DEFAULT_CONCURRENCY,
            unit_timeout_secs: DEFAULT_UNIT_TIMEOUT_SECS,
        }
    }
}

impl InventoryConfig {
    pub fn from_yaml(source: &str) -> Result<Self> {
        // An empty file is a valid, all-defaults configuration.
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&source)?;
        tracing::debug!(path = %path.display(), accounts = config.accounts.len(), "config loaded");
        Ok(config)
    }

    pub fn unit_timeout(&self) -> Duration {
        Duration::from_secs(self.unit_timeout_secs)
    }

    /// Every problem that prevents a collection run.
    pub fn collection_problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.accounts.is_empty() {
            problems.push("no accounts configured".to_string());
        }
        let mut seen = HashSet::new();
        for (i, account) in self.accounts.iter().enumerate() {
            let id = account.account_id.trim();
            if id.is_empty() {
                problems.push(format!("accounts[{}]: account_id is empty", i));
            } else if id.len() != 12 || !id.chars().all(|c| c.is_ascii_digit()) {
                problems.push(format!("accounts[{}]: '{}' is not a 12-digit account ID", i, id));
            } else if !seen.insert(id) {
                problems.push(format!("accounts[{}]: duplicate account {}", i, id));
            }
            if account.role_arn.trim().is_empty() {
                problems.push(format!("accounts[{}]: role_arn is empty", i));
            }
        }

        if self.default_region.trim().is_empty() {
            problems.push("default_region is empty".to_string());
        }
        if self.regions.as_ref().is_some_and(|r| r.is_empty()) {
            problems.push("regions is an empty list".to_string());
        }
        if let Err(e) = ServiceKind::parse_selection(&self.services) {
            problems.push(e.to_string());
        }
        if self.session_name.trim().is_empty() {
            problems.push("session_name is empty".to_string());
        }
        if self.concurrency == 0 {
            problems.push("concurrency must be at least 1".to_string());
        }
        if self.unit_timeout_secs == 0 {
            problems.push("unit_timeout_secs must be at least 1".to_string());
        }

        problems
    }

    /// Every problem, including the publishing target.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = self.collection_problems();
        if self.spreadsheet_id().is_none() {
            problems.push("spreadsheet_id is not set (GOOGLE_SHEETS_ID)".to_string());
        }
        problems
    }

    pub fn validate(&self) -> Result<()> {
        into_result(self.problems())
    }

    /// Validation for runs that do not publish (dry runs).
    pub fn validate_collection(&self) -> Result<()> {
        into_result(self.collection_problems())
    }

    pub fn spreadsheet_id(&self) -> Option<&str> {
        self.spreadsheet_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Unvalidated work selection. `catalogue` supplies the regions when the
    /// configuration lists none.
    pub fn to_selection(&self, catalogue: impl FnOnce() -> Vec<String>) -> Selection {
        Selection {
            accounts: self.accounts.clone(),
            account_filter: None,
            services: self.services.clone(),
            regions: self.regions.clone().unwrap_or_else(catalogue),
            default_region: self.default_region.clone(),
        }
    }
}

fn into_result(problems: Vec<String>) -> Result<()> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(problems))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT_A: &str = "111111111111";

    fn valid() -> InventoryConfig {
        InventoryConfig {
            accounts: vec![AccountRef::new(
                ACCOUNT_A,
                "arn:aws:iam::111111111111:role/InventoryReader",
            )],
            spreadsheet_id: Some("1AbC".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_from_minimal_yaml() {
        let yaml = r#"
accounts:
  - account_id: "111111111111"
    role_arn: "arn:aws:iam::111111111111:role/InventoryReader"
    external_id: "ext-1"
"#;
        let config = InventoryConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.default_region, "ap-northeast-2");
        assert_eq!(config.session_name, "skytally");
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.unit_timeout(), Duration::from_secs(120));
        assert_eq!(config.services.len(), 4);
        assert!(config.regions.is_none());
        assert_eq!(config.accounts[0].external_id.as_deref(), Some("ext-1"));
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
accounts:
  - account_id: "111111111111"
    role_arn: "arn:aws:iam::111111111111:role/InventoryReader"
default_region: us-east-1
regions: [us-east-1, eu-west-1]
services: [ec2, s3]
spreadsheet_id: "1AbC"
session_name: audit
concurrency: 2
unit_timeout_secs: 30
"#;
        let config = InventoryConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.regions.as_deref().unwrap(), ["us-east-1", "eu-west-1"]);
        assert_eq!(config.services, vec!["ec2", "s3"]);
        assert_eq!(config.concurrency, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(InventoryConfig::from_yaml("  \n").unwrap(), InventoryConfig::default());
    }

    #[test]
    fn test_malformed_yaml() {
        let result = InventoryConfig::from_yaml("accounts: [unterminated");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let config = InventoryConfig {
            concurrency: 0,
            services: vec!["compute".into(), "lambda".into()],
            ..Default::default()
        };
        let Err(ConfigError::Invalid(problems)) = config.validate() else {
            panic!("expected validation failure");
        };
        assert_eq!(problems.len(), 4, "{:?}", problems);
        assert!(problems.iter().any(|p| p.contains("no accounts")));
        assert!(problems.iter().any(|p| p.contains("lambda")));
        assert!(problems.iter().any(|p| p.contains("concurrency")));
        assert!(problems.iter().any(|p| p.contains("spreadsheet_id")));
    }

    #[test]
    fn test_account_problems() {
        let mut config = valid();
        config.accounts.push(AccountRef::new(ACCOUNT_A, "arn:other"));
        config.accounts.push(AccountRef::new("12345", ""));

        let problems = config.problems();
        assert!(problems.iter().any(|p| p.contains("duplicate account 111111111111")));
        assert!(problems.iter().any(|p| p.contains("'12345'")));
        assert!(problems.iter().any(|p| p.contains("accounts[2]: role_arn is empty")));
    }

    #[test]
    fn test_dry_run_does_not_need_spreadsheet() {
        let mut config = valid();
        config.spreadsheet_id = Some("   ".to_string());
        assert!(config.validate_collection().is_ok());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_to_selection_falls_back_to_catalogue() {
        let config = valid();
        let selection = config.to_selection(|| vec!["us-east-1".to_string()]);
        assert_eq!(selection.regions, vec!["us-east-1"]);
        assert_eq!(selection.default_region, "ap-northeast-2");
        assert!(selection.account_filter.is_none());

        let mut config = valid();
        config.regions = Some(vec!["eu-west-1".to_string()]);
        let selection = config.to_selection(|| unreachable!());
        assert_eq!(selection.regions, vec!["eu-west-1"]);
    }
}
