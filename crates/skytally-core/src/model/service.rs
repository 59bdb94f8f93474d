use crate::error::{InventoryError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The closed set of inventoried resource families.
///
/// Adding a family means adding a variant here; every `match` over the set
/// (collector dispatch, schemas, natural keys) then fails to compile until the
/// new family is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceKind {
    Compute,
    ObjectStorage,
    Database,
    VirtualDesktop,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 4] = [
        ServiceKind::Compute,
        ServiceKind::ObjectStorage,
        ServiceKind::Database,
        ServiceKind::VirtualDesktop,
    ];

    /// Canonical name, also used as the tab prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Compute => "compute",
            ServiceKind::ObjectStorage => "object-storage",
            ServiceKind::Database => "database",
            ServiceKind::VirtualDesktop => "virtual-desktop",
        }
    }

    /// Provider-side alias accepted in configuration.
    pub fn alias(&self) -> &'static str {
        match self {
            ServiceKind::Compute => "ec2",
            ServiceKind::ObjectStorage => "s3",
            ServiceKind::Database => "rds",
            ServiceKind::VirtualDesktop => "workspaces",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceKind::Compute => "EC2 Instances",
            ServiceKind::ObjectStorage => "S3 Buckets",
            ServiceKind::Database => "RDS Instances",
            ServiceKind::VirtualDesktop => "WorkSpaces",
        }
    }

    /// Account-global services are collected once per account, in the
    /// default region only.
    pub fn is_global(&self) -> bool {
        matches!(self, ServiceKind::ObjectStorage)
    }

    /// Column holding the natural identifier of a row.
    pub fn natural_key(&self) -> &'static str {
        match self {
            ServiceKind::Compute => "instance_id",
            ServiceKind::ObjectStorage => "bucket_name",
            ServiceKind::Database => "db_instance_id",
            ServiceKind::VirtualDesktop => "workspace_id",
        }
    }

    /// Parse a service selection, preserving order and dropping repeats.
    ///
    /// Any unknown name fails the whole selection, as does an empty one.
    pub fn parse_selection<S: AsRef<str>>(names: &[S]) -> Result<Vec<ServiceKind>> {
        let mut selected = Vec::new();
        let mut unknown = Vec::new();

        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            match name.parse::<ServiceKind>() {
                Ok(service) if !selected.contains(&service) => selected.push(service),
                Ok(_) => {}
                Err(_) => unknown.push(name.to_string()),
            }
        }

        if !unknown.is_empty() {
            return Err(InventoryError::Configuration(format!(
                "unknown service(s): {} (available: {})",
                unknown.join(", "),
                Self::ALL.map(|s| s.as_str()).join(", ")
            )));
        }
        if selected.is_empty() {
            return Err(InventoryError::Configuration(
                "no services selected".to_string(),
            ));
        }
        Ok(selected)
    }
}

impl FromStr for ServiceKind {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|service| service.as_str() == lowered || service.alias() == lowered)
            .ok_or_else(|| InventoryError::Configuration(format!("unknown service: {}", s)))
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
