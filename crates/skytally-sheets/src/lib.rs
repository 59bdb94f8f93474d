//! Skytally Sheets
//!
//! Publishes service tables to dated spreadsheet tabs and highlights the
//! difference between two of them.
//!
//! # Backends
//!
//! - **Google Sheets**: Sheets API v4 over REST (Bearer token)
//! - **Memory**: in-process store for dry runs and tests

pub mod backend;
pub mod error;
pub mod google;
pub mod highlight;
pub mod memory;
pub mod publisher;

// Re-exports
pub use backend::{
    ADDITION_COLOR, REMOVAL_COLOR, Rgb, RowFormat, SheetsBackend, TabInfo, marker_color,
};
pub use error::{PublishError, Result};
pub use google::{GoogleSheetsBackend, GoogleSheetsConfig, spreadsheet_url};
pub use highlight::{
    DiffOutcome, DiffRequest, HighlightPlan, apply_highlight, diff_tabs, load_table,
    plan_highlight,
};
pub use memory::MemoryBackend;
pub use publisher::{PublishReport, Publisher, SheetRef};
