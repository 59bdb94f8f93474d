use super::{ACCOUNT_ID, REGION, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of a service's normalized schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    /// Rendered cell text; missing columns render empty.
    pub fn cell(&self, column: &str) -> String {
        self.get(column).map(Value::render).unwrap_or_default()
    }

    pub fn account_id(&self) -> String {
        self.cell(ACCOUNT_ID)
    }

    pub fn region(&self) -> String {
        self.cell(REGION)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render the record in the given column order.
    pub fn to_row(&self, columns: &[String]) -> Vec<String> {
        columns.iter().map(|c| self.cell(c)).collect()
    }

    /// Columns whose values differ between two records.
    ///
    /// Strict equality: a column missing on one side compares as `Empty`.
    pub fn changed_columns(&self, other: &Record) -> Vec<String> {
        let mut columns: Vec<&String> = self.fields.keys().chain(other.fields.keys()).collect();
        columns.sort();
        columns.dedup();

        columns
            .into_iter()
            .filter(|c| {
                let left = self.fields.get(*c).unwrap_or(&Value::Empty);
                let right = other.fields.get(*c).unwrap_or(&Value::Empty);
                left != right
            })
            .cloned()
            .collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}
