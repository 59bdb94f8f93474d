//! Spreadsheet publisher
//!
//! Writes each service table to its own `<service>-<date>` tab. An existing
//! tab with the same name is fully replaced; rows are never appended to it.

use crate::backend::{RowFormat, SheetsBackend, TabInfo};
use crate::error::{PublishError, Result};
use crate::google::spreadsheet_url;
use serde::Serialize;
use skytally_core::{Marker, ServiceKind, Table};

/// Where a table was published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetRef {
    pub spreadsheet_id: String,
    pub tab: TabInfo,
    /// Data rows, excluding the header
    pub rows_written: usize,
    /// The tab existed and was replaced
    pub replaced: bool,
}

impl SheetRef {
    pub fn url(&self) -> String {
        format!("{}#gid={}", spreadsheet_url(&self.spreadsheet_id), self.tab.sheet_id)
    }
}

/// Per-table publish outcomes of one run.
#[derive(Debug, Default)]
pub struct PublishReport {
    pub published: Vec<SheetRef>,
    pub failed: Vec<(ServiceKind, PublishError)>,
}

impl PublishReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// At least one table was attempted and none of them landed.
    pub fn nothing_published(&self) -> bool {
        self.published.is_empty() && !self.failed.is_empty()
    }
}

pub struct Publisher<B> {
    backend: B,
}

impl<B: SheetsBackend> Publisher<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn sheet_url(&self) -> String {
        spreadsheet_url(self.backend.spreadsheet_id())
    }

    /// Create or replace the table's tab and write header plus rows.
    pub async fn publish(&self, table: &Table) -> Result<SheetRef> {
        let title = table.tab_name();

        let (tab, replaced) = match self.backend.find_tab(&title).await? {
            Some(tab) => {
                self.backend.clear_tab(&tab, 0).await?;
                // Drop highlight left by an earlier diff against this tab.
                self.backend
                    .format_rows(&tab, &[RowFormat::from_row(0, Marker::Unmarked)])
                    .await?;
                (tab, true)
            }
            None => (self.backend.add_tab(&title).await?, false),
        };

        self.backend.write_rows(&tab, 0, &table.to_rows()).await?;

        tracing::info!(
            backend = self.backend.name(),
            tab = %tab.title,
            rows = table.len(),
            replaced,
            "table published"
        );

        Ok(SheetRef {
            spreadsheet_id: self.backend.spreadsheet_id().to_string(),
            tab,
            rows_written: table.len(),
            replaced,
        })
    }

    /// Publish tables one after another. A failed table is recorded and the
    /// remaining tables are still attempted.
    pub async fn publish_all<'a, I>(&self, tables: I) -> PublishReport
    where
        I: IntoIterator<Item = &'a Table>,
    {
        let mut report = PublishReport::default();
        for table in tables {
            match self.publish(table).await {
                Ok(sheet) => report.published.push(sheet),
                Err(e) => {
                    tracing::error!(tab = %table.tab_name(), error = %e, "publish failed");
                    report.failed.push((table.service(), e));
                }
            }
        }
        report
    }
}
