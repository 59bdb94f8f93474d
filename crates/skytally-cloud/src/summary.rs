//! Collection run results

use crate::error::CloudError;
use crate::plan::UnitCoordinates;
use skytally_core::{ServiceKind, Table};
use std::collections::BTreeMap;

/// A unit that failed, with its coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitFailure {
    pub unit: UnitCoordinates,
    pub error: CloudError,
}

/// Merged result for one service.
#[derive(Debug, Clone)]
pub struct ServiceOutcome {
    pub table: Table,

    pub units_total: usize,

    pub units_failed: usize,
}

impl ServiceOutcome {
    /// Every unit for the service failed; the table is empty and must not
    /// be mistaken for "no resources".
    pub fn is_flagged(&self) -> bool {
        self.units_total > 0 && self.units_failed == self.units_total
    }

    pub fn service(&self) -> ServiceKind {
        self.table.service()
    }
}

/// Per-account roll-up for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountSummary {
    pub resources: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Outcome of one aggregation run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// One outcome per selected service, in selection order.
    pub services: Vec<ServiceOutcome>,

    /// Every failed unit; non-fatal unless a whole service failed.
    pub failures: Vec<UnitFailure>,

    /// Records and unit counts per account, including failed units.
    pub accounts: BTreeMap<String, AccountSummary>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl RunSummary {
    pub fn outcome(&self, service: ServiceKind) -> Option<&ServiceOutcome> {
        self.services.iter().find(|o| o.service() == service)
    }

    pub fn table(&self, service: ServiceKind) -> Option<&Table> {
        self.outcome(service).map(|o| &o.table)
    }

    /// Tables of services that had at least one successful unit.
    pub fn publishable(&self) -> impl Iterator<Item = &Table> {
        self.services
            .iter()
            .filter(|o| !o.is_flagged())
            .map(|o| &o.table)
    }

    pub fn total_records(&self) -> usize {
        self.services.iter().map(|o| o.table.len()).sum()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// No service produced a table.
    pub fn is_total_failure(&self) -> bool {
        self.services.iter().all(ServiceOutcome::is_flagged)
    }

    pub fn failures_for(&self, service: ServiceKind) -> Vec<&UnitFailure> {
        self.failures
            .iter()
            .filter(|f| f.unit.service == service)
            .collect()
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flagged = self.services.iter().filter(|o| o.is_flagged()).count();
        write!(
            f,
            "{} records across {} services, {} failed units, {} services without data",
            self.total_records(),
            self.services.len(),
            self.failures.len(),
            flagged
        )
    }
}
