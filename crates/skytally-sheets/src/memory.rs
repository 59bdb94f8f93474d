//! In-memory spreadsheet backend
//!
//! Used by `collect --dry-run` and by tests. Tracks cell values and the
//! marker of every row, so highlight output can be inspected.

use crate::backend::{RowFormat, SheetsBackend, TabInfo};
use crate::error::{PublishError, Result};
use async_trait::async_trait;
use skytally_core::Marker;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::Mutex;

#[derive(Debug)]
struct MemoryTab {
    info: TabInfo,
    rows: Vec<Vec<String>>,
    markers: BTreeMap<usize, Marker>,
}

#[derive(Debug, Default)]
struct MemoryState {
    tabs: Vec<MemoryTab>,
    next_sheet_id: i64,
    deny_writes: bool,
    denied_tabs: BTreeSet<String>,
}

impl MemoryState {
    fn tab_mut(&mut self, tab: &TabInfo) -> Result<&mut MemoryTab> {
        self.tabs
            .iter_mut()
            .find(|t| t.info.sheet_id == tab.sheet_id)
            .ok_or_else(|| PublishError::NotFound(format!("tab '{}'", tab.title)))
    }

    fn tab(&self, title: &str) -> Option<&MemoryTab> {
        self.tabs.iter().find(|t| t.info.title == title)
    }
}

#[derive(Debug)]
pub struct MemoryBackend {
    spreadsheet_id: String,
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Make every subsequent write fail with `PermissionDenied`.
    pub async fn deny_writes(&self, deny: bool) {
        self.state.lock().await.deny_writes = deny;
    }

    /// Make writes to one tab fail with `PermissionDenied`; other tabs stay
    /// writable.
    pub async fn deny_tab(&self, title: impl Into<String>) {
        self.state.lock().await.denied_tabs.insert(title.into());
    }

    pub async fn tab_titles(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .tabs
            .iter()
            .map(|t| t.info.title.clone())
            .collect()
    }

    pub async fn rows(&self, title: &str) -> Option<Vec<Vec<String>>> {
        self.state.lock().await.tab(title).map(|t| t.rows.clone())
    }

    /// Marked rows only; unmarked rows are absent.
    pub async fn markers(&self, title: &str) -> BTreeMap<usize, Marker> {
        self.state
            .lock()
            .await
            .tab(title)
            .map(|t| t.markers.clone())
            .unwrap_or_default()
    }

    fn check_writable(&self, state: &MemoryState, title: &str) -> Result<()> {
        if state.deny_writes || state.denied_tabs.contains(title) {
            return Err(PublishError::PermissionDenied {
                spreadsheet_id: self.spreadsheet_id.clone(),
                message: format!("writes to '{title}' denied"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SheetsBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    async fn list_tabs(&self) -> Result<Vec<TabInfo>> {
        Ok(self
            .state
            .lock()
            .await
            .tabs
            .iter()
            .map(|t| t.info.clone())
            .collect())
    }

    async fn add_tab(&self, title: &str) -> Result<TabInfo> {
        let mut state = self.state.lock().await;
        self.check_writable(&state, title)?;
        if state.tab(title).is_some() {
            return Err(PublishError::Api {
                status: 400,
                message: format!("A sheet with the name \"{title}\" already exists"),
            });
        }

        state.next_sheet_id += 1;
        let info = TabInfo {
            sheet_id: state.next_sheet_id,
            title: title.to_string(),
        };
        state.tabs.push(MemoryTab {
            info: info.clone(),
            rows: Vec::new(),
            markers: BTreeMap::new(),
        });
        Ok(info)
    }

    async fn clear_tab(&self, tab: &TabInfo, from_row: usize) -> Result<()> {
        let mut state = self.state.lock().await;
        self.check_writable(&state, &tab.title)?;
        let tab = state.tab_mut(tab)?;
        tab.rows.truncate(from_row);
        Ok(())
    }

    async fn write_rows(
        &self,
        tab: &TabInfo,
        start_row: usize,
        rows: &[Vec<String>],
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        self.check_writable(&state, &tab.title)?;
        let tab = state.tab_mut(tab)?;

        let end = start_row + rows.len();
        if tab.rows.len() < end {
            tab.rows.resize(end, Vec::new());
        }
        for (offset, row) in rows.iter().enumerate() {
            tab.rows[start_row + offset] = row.clone();
        }
        Ok(())
    }

    async fn read_rows(&self, tab: &TabInfo) -> Result<Vec<Vec<String>>> {
        let mut state = self.state.lock().await;
        let tab = state.tab_mut(tab)?;
        let mut rows = tab.rows.clone();
        while rows.last().is_some_and(|r| r.iter().all(String::is_empty)) {
            rows.pop();
        }
        Ok(rows)
    }

    async fn format_rows(&self, tab: &TabInfo, formats: &[RowFormat]) -> Result<()> {
        let mut state = self.state.lock().await;
        self.check_writable(&state, &tab.title)?;
        let tab = state.tab_mut(tab)?;

        for format in formats {
            let end = format.end_row.unwrap_or(tab.rows.len().max(format.start_row));
            match format.marker {
                Marker::Unmarked => {
                    tab.markers.retain(|row, _| !format.contains(*row));
                }
                marker => {
                    for row in format.start_row..end {
                        tab.markers.insert(row, marker);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn test_write_clear_read() {
        let backend = MemoryBackend::new("doc");
        let tab = backend.add_tab("compute-20241114").await.unwrap();

        backend
            .write_rows(&tab, 0, &[row(&["id"]), row(&["i-1"]), row(&["i-2"])])
            .await
            .unwrap();
        backend.write_rows(&tab, 4, &[row(&["x"])]).await.unwrap();
        assert_eq!(backend.read_rows(&tab).await.unwrap().len(), 5);

        backend.clear_tab(&tab, 2).await.unwrap();
        assert_eq!(
            backend.read_rows(&tab).await.unwrap(),
            vec![row(&["id"]), row(&["i-1"])]
        );
    }

    #[tokio::test]
    async fn test_duplicate_tab_is_rejected() {
        let backend = MemoryBackend::new("doc");
        backend.add_tab("s3-20241114").await.unwrap();
        assert!(backend.add_tab("s3-20241114").await.is_err());
    }

    #[tokio::test]
    async fn test_unmarked_format_resets() {
        let backend = MemoryBackend::new("doc");
        let tab = backend.add_tab("t").await.unwrap();
        backend
            .format_rows(
                &tab,
                &[
                    RowFormat::rows(1, 3, Marker::Addition),
                    RowFormat::rows(5, 6, Marker::Removal),
                ],
            )
            .await
            .unwrap();
        assert_eq!(backend.markers("t").await.len(), 3);

        backend
            .format_rows(&tab, &[RowFormat::from_row(2, Marker::Unmarked)])
            .await
            .unwrap();
        let markers = backend.markers("t").await;
        assert_eq!(markers.into_iter().collect::<Vec<_>>(), vec![(1, Marker::Addition)]);
    }

    #[tokio::test]
    async fn test_denied_writes() {
        let backend = MemoryBackend::new("doc");
        backend.deny_writes(true).await;
        let err = backend.add_tab("t").await.unwrap_err();
        assert!(matches!(err, PublishError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_denied_tab_leaves_others_writable() {
        let backend = MemoryBackend::new("doc");
        let open = backend.add_tab("s3-20241114").await.unwrap();
        backend.deny_tab("compute-20241114").await;

        let err = backend.add_tab("compute-20241114").await.unwrap_err();
        assert!(matches!(err, PublishError::PermissionDenied { .. }));
        backend.write_rows(&open, 0, &[row(&["bucket"])]).await.unwrap();
        assert_eq!(backend.tab_titles().await, vec!["s3-20241114"]);
    }
}
