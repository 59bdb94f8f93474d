//! Spreadsheet backend abstraction
//!
//! The core treats the spreadsheet as a remote table store keyed by
//! (document id, tab title). Row indices are 0-based; row 0 is the header.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use skytally_core::Marker;

/// One tab of the spreadsheet document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    /// Backend-assigned numeric id (Google's `sheetId`)
    pub sheet_id: i64,
    pub title: String,
}

/// Background marker applied to a row range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowFormat {
    pub start_row: usize,
    /// Exclusive; `None` runs to the end of the tab.
    pub end_row: Option<usize>,
    pub marker: Marker,
}

impl RowFormat {
    pub fn rows(start_row: usize, end_row: usize, marker: Marker) -> Self {
        Self {
            start_row,
            end_row: Some(end_row),
            marker,
        }
    }

    pub fn from_row(start_row: usize, marker: Marker) -> Self {
        Self {
            start_row,
            end_row: None,
            marker,
        }
    }

    pub fn contains(&self, row: usize) -> bool {
        row >= self.start_row && self.end_row.is_none_or(|end| row < end)
    }
}

/// RGB background, components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgb {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

/// Light green
pub const ADDITION_COLOR: Rgb = Rgb {
    red: 0.85,
    green: 0.92,
    blue: 0.83,
};

/// Light red
pub const REMOVAL_COLOR: Rgb = Rgb {
    red: 0.96,
    green: 0.80,
    blue: 0.80,
};

/// Background for a marker; `None` means no background.
pub fn marker_color(marker: Marker) -> Option<Rgb> {
    match marker {
        Marker::Addition => Some(ADDITION_COLOR),
        Marker::Removal => Some(REMOVAL_COLOR),
        Marker::Unmarked => None,
    }
}

#[async_trait]
pub trait SheetsBackend: Send + Sync {
    /// Returns the backend name (e.g., "google-sheets")
    fn name(&self) -> &str;

    fn spreadsheet_id(&self) -> &str;

    async fn list_tabs(&self) -> Result<Vec<TabInfo>>;

    async fn add_tab(&self, title: &str) -> Result<TabInfo>;

    /// Clear cell values from `from_row` to the end of the tab.
    async fn clear_tab(&self, tab: &TabInfo, from_row: usize) -> Result<()>;

    /// Write rows starting at `start_row`, column A.
    async fn write_rows(&self, tab: &TabInfo, start_row: usize, rows: &[Vec<String>]) -> Result<()>;

    /// Every non-empty row from the top of the tab. Trailing empty cells
    /// may be omitted.
    async fn read_rows(&self, tab: &TabInfo) -> Result<Vec<Vec<String>>>;

    /// Apply markers in order; later formats override earlier ones.
    async fn format_rows(&self, tab: &TabInfo, formats: &[RowFormat]) -> Result<()>;

    async fn find_tab(&self, title: &str) -> Result<Option<TabInfo>> {
        Ok(self
            .list_tabs()
            .await?
            .into_iter()
            .find(|tab| tab.title == title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_format_ranges() {
        let bounded = RowFormat::rows(2, 4, Marker::Addition);
        assert!(!bounded.contains(1));
        assert!(bounded.contains(2));
        assert!(bounded.contains(3));
        assert!(!bounded.contains(4));

        let open = RowFormat::from_row(5, Marker::Unmarked);
        assert!(open.contains(5));
        assert!(open.contains(10_000));
    }

    #[test]
    fn test_marker_colors() {
        assert_eq!(marker_color(Marker::Addition), Some(ADDITION_COLOR));
        assert_eq!(marker_color(Marker::Removal), Some(REMOVAL_COLOR));
        assert_eq!(marker_color(Marker::Unmarked), None);
    }
}
