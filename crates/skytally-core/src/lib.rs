//! Skytally core
//!
//! Data model shared by every Skytally crate: account references, the closed
//! set of inventoried services, normalized records and dated tables, plus the
//! snapshot differencer that compares two tables.

pub mod diff;
pub mod error;
pub mod model;

pub use diff::{
    CompareMode, DataIntegrityWarning, DiffResult, LoadedSnapshots, Marker, Side, SnapshotKey,
};
pub use error::{InventoryError, Result};
pub use model::{
    AccountRef, FieldDefault, FieldMapping, ProviderFields, Record, ServiceKind, Table,
    TableBuilder, Value, format_date, normalize, parse_date,
};
