use super::{ACCOUNT_ID, REGION, Record, ServiceKind, Value};
use crate::error::{InventoryError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const DATE_FORMAT: &str = "%Y%m%d";

/// Date tag used in tab names (`YYYYMMDD`).
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| InventoryError::InvalidDate(s.to_string()))
}

/// One service's complete, dated, normalized record set.
///
/// Built once (by [`TableBuilder`] or [`Table::from_rows`]) and never mutated
/// afterwards; a later run produces a new table with a new date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    service: ServiceKind,
    date: NaiveDate,
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Table {
    pub fn new(
        service: ServiceKind,
        date: NaiveDate,
        columns: Vec<String>,
        records: Vec<Record>,
    ) -> Self {
        Self {
            service,
            date,
            columns,
            records,
        }
    }

    /// Rebuild a table from sheet rows: header first, then data rows.
    ///
    /// Reading stops at the first fully blank row; anything below it is
    /// annotation, not snapshot data.
    pub fn from_rows(service: ServiceKind, date: NaiveDate, rows: &[Vec<String>]) -> Self {
        let Some((header, data)) = rows.split_first() else {
            return Self::new(service, date, Vec::new(), Vec::new());
        };

        let columns: Vec<String> = header.iter().map(|c| c.trim().to_string()).collect();
        let records = data
            .iter()
            .take_while(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .map(|row| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(i, column)| {
                        let cell = row.get(i).map(String::as_str).unwrap_or("");
                        (column.clone(), Value::from_cell(cell))
                    })
                    .collect()
            })
            .collect();

        Self::new(service, date, columns, records)
    }

    pub fn service(&self) -> ServiceKind {
        self.service
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Deterministic `<service>-<date>` tab name.
    pub fn tab_name(&self) -> String {
        Self::tab_name_for(self.service, self.date)
    }

    pub fn tab_name_for(service: ServiceKind, date: NaiveDate) -> String {
        format!("{}-{}", service.as_str(), format_date(date))
    }

    /// Header row followed by one rendered row per record.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        std::iter::once(self.columns.clone())
            .chain(self.records.iter().map(|r| r.to_row(&self.columns)))
            .collect()
    }
}

/// Accumulates records for one service, dropping rows whose
/// (account_id, region, natural identifier) was already merged.
#[derive(Debug)]
pub struct TableBuilder {
    service: ServiceKind,
    date: NaiveDate,
    columns: Vec<String>,
    records: Vec<Record>,
    seen: HashSet<(String, String, String)>,
    duplicates: usize,
}

impl TableBuilder {
    pub fn new(service: ServiceKind, date: NaiveDate, columns: Vec<String>) -> Self {
        Self {
            service,
            date,
            columns,
            records: Vec::new(),
            seen: HashSet::new(),
            duplicates: 0,
        }
    }

    /// Returns false when the record was a duplicate and was dropped.
    pub fn push(&mut self, record: Record) -> bool {
        let key = (
            record.cell(ACCOUNT_ID),
            record.cell(REGION),
            record.cell(self.service.natural_key()),
        );
        if !self.seen.insert(key) {
            self.duplicates += 1;
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = Record>) -> usize {
        records
            .into_iter()
            .map(|r| self.push(r))
            .filter(|kept| *kept)
            .count()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn build(self) -> Table {
        if self.duplicates > 0 {
            tracing::debug!(
                service = %self.service,
                dropped = self.duplicates,
                "duplicate rows dropped during merge"
            );
        }
        Table::new(self.service, self.date, self.columns, self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, 14).unwrap()
    }

    fn instance(account: &str, region: &str, id: &str) -> Record {
        Record::new()
            .with(ACCOUNT_ID, account)
            .with(REGION, region)
            .with("instance_id", id)
    }

    #[test]
    fn test_tab_name() {
        let table = Table::new(ServiceKind::ObjectStorage, date(), vec![], vec![]);
        assert_eq!(table.tab_name(), "object-storage-20241114");
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("20241114").unwrap(), date());
        assert!(matches!(
            parse_date("2024-11-14"),
            Err(InventoryError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_builder_dedups_by_coordinates() {
        let columns = vec!["account_id".into(), "region".into(), "instance_id".into()];
        let mut builder = TableBuilder::new(ServiceKind::Compute, date(), columns);

        assert!(builder.push(instance("1", "us-east-1", "i-1")));
        assert!(!builder.push(instance("1", "us-east-1", "i-1")));
        // Same identifier in another account or region is a different row.
        assert!(builder.push(instance("2", "us-east-1", "i-1")));
        assert!(builder.push(instance("1", "ap-northeast-2", "i-1")));

        assert_eq!(builder.duplicates(), 1);
        assert_eq!(builder.build().len(), 3);
    }

    #[test]
    fn test_rows_round_trip_stops_at_blank_row() {
        let rows = vec![
            vec!["id".to_string(), "state".to_string()],
            vec!["i-1".to_string(), "running".to_string()],
            vec!["i-2".to_string()],
            vec![String::new(), String::new()],
            vec!["i-9".to_string(), "terminated".to_string()],
        ];
        let table = Table::from_rows(ServiceKind::Compute, date(), &rows);

        assert_eq!(table.columns(), ["id", "state"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[1].get("state"), Some(&Value::Empty));
        assert_eq!(table.to_rows()[..2], rows[..2]);
    }

    #[test]
    fn test_from_rows_without_header() {
        let table = Table::from_rows(ServiceKind::Compute, date(), &[]);
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
    }
}
