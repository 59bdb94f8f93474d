//! Static provider-field → normalized-column mapping tables

use super::{ACCOUNT_ID, REGION, Record, Value};
use std::collections::HashMap;

/// Raw values extracted from one provider item, keyed by provider field path
/// (e.g. `"Placement.AvailabilityZone"`).
pub type ProviderFields = HashMap<&'static str, Value>;

/// Value used when the provider omits a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    Empty,
    Text(&'static str),
    Number(f64),
}

impl FieldDefault {
    pub fn to_value(self) -> Value {
        match self {
            FieldDefault::Empty => Value::Empty,
            FieldDefault::Text(s) => Value::text(s),
            FieldDefault::Number(n) => Value::Number(n),
        }
    }
}

/// One row of a collector's mapping table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldMapping {
    pub provider: &'static str,
    pub column: &'static str,
    pub default: FieldDefault,
}

impl FieldMapping {
    pub const fn new(provider: &'static str, column: &'static str) -> Self {
        Self {
            provider,
            column,
            default: FieldDefault::Empty,
        }
    }

    pub const fn or_text(mut self, default: &'static str) -> Self {
        self.default = FieldDefault::Text(default);
        self
    }

    pub const fn or_number(mut self, default: f64) -> Self {
        self.default = FieldDefault::Number(default);
        self
    }

    /// Ordered column list for a mapping table, led by the columns every
    /// record carries.
    pub fn columns(mapping: &[FieldMapping]) -> Vec<String> {
        [ACCOUNT_ID, REGION]
            .into_iter()
            .chain(mapping.iter().map(|m| m.column))
            .map(str::to_string)
            .collect()
    }
}

/// Apply a mapping table to one provider item.
///
/// Every mapped column is present in the result; missing or blank provider
/// values take the mapping's default so rows stay rectangular.
pub fn normalize(
    mapping: &[FieldMapping],
    mut fields: ProviderFields,
    account_id: &str,
    region: &str,
) -> Record {
    let mut record = Record::new()
        .with(ACCOUNT_ID, account_id)
        .with(REGION, region);

    for m in mapping {
        let value = fields
            .remove(m.provider)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| m.default.to_value());
        record.insert(m.column, value);
    }

    if !fields.is_empty() {
        tracing::trace!(
            unmapped = ?fields.keys().collect::<Vec<_>>(),
            "provider fields without mapping ignored"
        );
    }

    record
}
