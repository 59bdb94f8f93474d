//! Work set enumeration: accounts × regions × services

use serde::{Deserialize, Serialize};
use skytally_core::{AccountRef, InventoryError, ServiceKind};

/// Coordinates of one unit of collection work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitCoordinates {
    pub service: ServiceKind,
    pub account_id: String,
    pub region: String,
}

impl std::fmt::Display for UnitCoordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}/{}", self.service, self.account_id, self.region)
    }
}

/// One (account, region, service) unit, ready to dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    pub service: ServiceKind,
    pub account: AccountRef,
    pub region: String,
}

impl WorkUnit {
    pub fn coordinates(&self) -> UnitCoordinates {
        UnitCoordinates {
            service: self.service,
            account_id: self.account.account_id.clone(),
            region: self.region.clone(),
        }
    }
}

/// Unvalidated selection handed over by configuration.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub accounts: Vec<AccountRef>,
    /// Restrict to these account IDs; `None` keeps every account.
    pub account_filter: Option<Vec<String>>,
    pub services: Vec<String>,
    pub regions: Vec<String>,
    pub default_region: String,
}

/// Validated work set. Building one performs no network activity.
#[derive(Debug, Clone)]
pub struct WorkPlan {
    services: Vec<ServiceKind>,
    units: Vec<WorkUnit>,
}

impl WorkPlan {
    /// Apply the service and account filters and enumerate every unit.
    ///
    /// Fails with a configuration error on an unknown service or account,
    /// or on any empty dimension.
    pub fn build(selection: &Selection) -> skytally_core::Result<Self> {
        let services = ServiceKind::parse_selection(&selection.services)?;

        let accounts: Vec<&AccountRef> = match &selection.account_filter {
            None => selection.accounts.iter().collect(),
            Some(filter) => {
                let unknown: Vec<&str> = filter
                    .iter()
                    .map(String::as_str)
                    .filter(|id| !selection.accounts.iter().any(|a| a.account_id == *id))
                    .collect();
                if !unknown.is_empty() {
                    return Err(InventoryError::Configuration(format!(
                        "unknown account(s): {}",
                        unknown.join(", ")
                    )));
                }
                selection
                    .accounts
                    .iter()
                    .filter(|a| filter.contains(&a.account_id))
                    .collect()
            }
        };
        if accounts.is_empty() {
            return Err(InventoryError::Configuration(
                "no accounts selected".to_string(),
            ));
        }

        let default_region = selection.default_region.trim();
        if default_region.is_empty() {
            return Err(InventoryError::Configuration(
                "default region is empty".to_string(),
            ));
        }

        let mut regions: Vec<&str> = Vec::new();
        for region in selection.regions.iter().map(|r| r.trim()) {
            if !region.is_empty() && !regions.contains(&region) {
                regions.push(region);
            }
        }
        if regions.is_empty() {
            return Err(InventoryError::Configuration(
                "no regions selected".to_string(),
            ));
        }

        let mut units = Vec::new();
        for account in &accounts {
            for service in &services {
                let unit_regions: &[&str] = if service.is_global() {
                    std::slice::from_ref(&default_region)
                } else {
                    &regions
                };
                for region in unit_regions {
                    units.push(WorkUnit {
                        service: *service,
                        account: (*account).clone(),
                        region: region.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            services = services.len(),
            accounts = accounts.len(),
            regions = regions.len(),
            units = units.len(),
            "work plan built"
        );

        Ok(Self { services, units })
    }

    pub fn services(&self) -> &[ServiceKind] {
        &self.services
    }

    pub fn units(&self) -> &[WorkUnit] {
        &self.units
    }

    pub fn units_for(&self, service: ServiceKind) -> usize {
        self.units.iter().filter(|u| u.service == service).count()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
