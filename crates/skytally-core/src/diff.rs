//! Snapshot differencer
//!
//! Compares two dated tables of the same service. The comparison runs in two
//! steps: [`LoadedSnapshots::load`] keys both sides (reporting duplicate keys),
//! then [`LoadedSnapshots::diff`] partitions the keys into added, removed and
//! common sets.
//!
//! ```text
//! source ──┐                  ┌── added   (target only)  → Marker::Addition
//!          ├─ load ─ diff ────┼── removed (source only)  → Marker::Removal
//! target ──┘                  └── common  (both)         → Marker::Unmarked
//! ```

use crate::error::{InventoryError, Result};
use crate::model::{ACCOUNT_ID, REGION, Record, ServiceKind, Table};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const KEY_SEPARATOR: &str = "/";

/// Column(s) identifying a row across two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotKey {
    columns: Vec<String>,
}

impl SnapshotKey {
    pub fn single(column: impl Into<String>) -> Self {
        Self {
            columns: vec![column.into()],
        }
    }

    pub fn composite<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// (account_id, region, natural identifier): the same identifier in two
    /// accounts or regions is two different resources.
    pub fn for_service(service: ServiceKind) -> Self {
        Self::composite([ACCOUNT_ID, REGION, service.natural_key()])
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Key string for one record; composite parts are joined with `/`.
    ///
    /// Inside a composite key, `\` and `/` in a cell are escaped so that
    /// distinct tuples never produce the same key.
    pub fn extract(&self, record: &Record) -> String {
        match self.columns.as_slice() {
            [single] => record.cell(single),
            columns => columns
                .iter()
                .map(|c| escape_part(&record.cell(c)))
                .collect::<Vec<_>>()
                .join(KEY_SEPARATOR),
        }
    }

    /// Index a table by key. Later rows overwrite earlier ones; the returned
    /// counts list every key seen more than once.
    pub fn index<'a>(
        &self,
        table: &'a Table,
    ) -> (BTreeMap<String, &'a Record>, BTreeMap<String, usize>) {
        let mut rows = BTreeMap::new();
        let mut occurrences: BTreeMap<String, usize> = BTreeMap::new();

        for record in table.records() {
            let key = self.extract(record);
            *occurrences.entry(key.clone()).or_default() += 1;
            rows.insert(key, record);
        }

        occurrences.retain(|_, count| *count > 1);
        (rows, occurrences)
    }

    fn validate(&self, side: Side, table: &Table) -> Result<()> {
        if self.columns.is_empty() {
            return Err(InventoryError::DiffInput(
                "snapshot key has no columns".to_string(),
            ));
        }
        if table.is_empty() {
            return Err(InventoryError::DiffInput(format!(
                "{} table {} is empty",
                side,
                table.tab_name()
            )));
        }
        if let Some(missing) = self.columns.iter().find(|c| !table.has_column(c)) {
            return Err(InventoryError::DiffInput(format!(
                "{} table {} has no '{}' column",
                side,
                table.tab_name(),
                missing
            )));
        }
        Ok(())
    }
}

fn escape_part(cell: &str) -> String {
    cell.replace('\\', "\\\\").replace('/', "\\/")
}

impl std::fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.columns.join(KEY_SEPARATOR))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Source,
    Target,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Source => write!(f, "source"),
            Side::Target => write!(f, "target"),
        }
    }
}

/// A key that occurs more than once within one side. Recoverable: the last
/// row with that key is the one compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataIntegrityWarning {
    pub side: Side,
    pub key: String,
    pub occurrences: usize,
}

impl std::fmt::Display for DataIntegrityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "duplicate key '{}' in {} ({} rows, last one kept)",
            self.key, self.side, self.occurrences
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompareMode {
    /// Partition keys only.
    #[default]
    KeysOnly,
    /// Also flag common keys whose rows differ in any column.
    Fields,
}

/// Visual marker applied to a row of the annotated sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    Addition,
    Removal,
    Unmarked,
}

/// Both sides keyed and ready to compare.
#[derive(Debug)]
pub struct LoadedSnapshots<'a> {
    key: SnapshotKey,
    source: BTreeMap<String, &'a Record>,
    target: BTreeMap<String, &'a Record>,
    warnings: Vec<DataIntegrityWarning>,
}

impl<'a> LoadedSnapshots<'a> {
    pub fn load(source: &'a Table, target: &'a Table, key: SnapshotKey) -> Result<Self> {
        key.validate(Side::Source, source)?;
        key.validate(Side::Target, target)?;

        let (source_rows, source_dups) = key.index(source);
        let (target_rows, target_dups) = key.index(target);

        let warnings: Vec<DataIntegrityWarning> = [
            (Side::Source, source_dups),
            (Side::Target, target_dups),
        ]
        .into_iter()
        .flat_map(|(side, dups)| {
            dups.into_iter()
                .map(move |(key, occurrences)| DataIntegrityWarning {
                    side,
                    key,
                    occurrences,
                })
        })
        .collect();

        for warning in &warnings {
            tracing::warn!(%warning, "data integrity warning");
        }

        Ok(Self {
            key,
            source: source_rows,
            target: target_rows,
            warnings,
        })
    }

    pub fn key(&self) -> &SnapshotKey {
        &self.key
    }

    pub fn warnings(&self) -> &[DataIntegrityWarning] {
        &self.warnings
    }

    pub fn diff(self, mode: CompareMode) -> DiffResult {
        let mut result = DiffResult {
            key: self.key,
            warnings: self.warnings,
            ..DiffResult::default()
        };

        for (key, target_row) in &self.target {
            match self.source.get(key) {
                None => {
                    result.added.insert(key.clone());
                }
                Some(source_row) => {
                    result.common.insert(key.clone());
                    if mode == CompareMode::Fields {
                        let columns = source_row.changed_columns(target_row);
                        if !columns.is_empty() {
                            result.changed.insert(key.clone(), columns);
                        }
                    }
                }
            }
        }

        result.removed = self
            .source
            .keys()
            .filter(|k| !self.target.contains_key(*k))
            .cloned()
            .collect();

        tracing::debug!(
            added = result.added.len(),
            removed = result.removed.len(),
            common = result.common.len(),
            changed = result.changed.len(),
            "snapshot diff computed"
        );

        result
    }
}

/// Added / removed / common partition of two snapshots' keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffResult {
    pub key: SnapshotKey,
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
    pub common: BTreeSet<String>,
    /// Common keys whose rows differ, with the differing columns.
    pub changed: BTreeMap<String, Vec<String>>,
    pub warnings: Vec<DataIntegrityWarning>,
}

impl DiffResult {
    pub fn marker_for(&self, key: &str) -> Marker {
        if self.added.contains(key) {
            Marker::Addition
        } else if self.removed.contains(key) {
            Marker::Removal
        } else {
            Marker::Unmarked
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty() || !self.changed.is_empty()
    }

    pub fn is_changed(&self, key: &str) -> bool {
        self.changed.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn table(day: u32, ids: &[&str]) -> Table {
        let records = ids
            .iter()
            .map(|id| Record::new().with("id", *id).with("state", "running"))
            .collect();
        Table::new(
            ServiceKind::Compute,
            NaiveDate::from_ymd_opt(2024, 11, day).unwrap(),
            vec!["id".into(), "state".into()],
            records,
        )
    }

    #[test]
    fn test_marker_contract() {
        let source = table(1, &["i-1", "i-2"]);
        let target = table(2, &["i-1", "i-3"]);
        let diff = LoadedSnapshots::load(&source, &target, SnapshotKey::single("id"))
            .unwrap()
            .diff(CompareMode::KeysOnly);

        assert_eq!(diff.marker_for("i-3"), Marker::Addition);
        assert_eq!(diff.marker_for("i-2"), Marker::Removal);
        assert_eq!(diff.marker_for("i-1"), Marker::Unmarked);
        assert!(diff.has_changes());
    }

    #[test]
    fn test_composite_key_extract() {
        let record = Record::new()
            .with("account_id", "111")
            .with("region", "us-east-1")
            .with("instance_id", "i-1");
        let key = SnapshotKey::for_service(ServiceKind::Compute);
        assert_eq!(key.extract(&record), "111/us-east-1/i-1");
        assert_eq!(key.to_string(), "account_id/region/instance_id");
    }

    #[test]
    fn test_composite_key_parts_containing_separator_stay_distinct() {
        let key = SnapshotKey::composite(["a", "b"]);
        let left = Record::new().with("a", "x/y").with("b", "z");
        let right = Record::new().with("a", "x").with("b", "y/z");
        let escaped = Record::new().with("a", "x\\").with("b", "y/z");

        assert_ne!(key.extract(&left), key.extract(&right));
        assert_ne!(key.extract(&right), key.extract(&escaped));
        assert_eq!(key.extract(&left), "x\\/y/z");

        // A single column is used verbatim.
        assert_eq!(SnapshotKey::single("a").extract(&left), "x/y");
    }

    #[test]
    fn test_empty_side_is_rejected() {
        let source = table(1, &[]);
        let target = table(2, &["i-1"]);
        let err = LoadedSnapshots::load(&source, &target, SnapshotKey::single("id")).unwrap_err();
        assert!(matches!(err, InventoryError::DiffInput(msg) if msg.contains("source")));
    }

    #[test]
    fn test_missing_key_column_is_rejected() {
        let source = table(1, &["i-1"]);
        let target = table(2, &["i-1"]);
        let err = LoadedSnapshots::load(&source, &target, SnapshotKey::single("instance_id"))
            .unwrap_err();
        assert!(matches!(err, InventoryError::DiffInput(msg) if msg.contains("instance_id")));
    }
}
