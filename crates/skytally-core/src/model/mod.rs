//! Inventory data model

mod account;
mod mapping;
mod record;
mod service;
mod table;
mod value;

pub use account::AccountRef;
pub use mapping::{FieldDefault, FieldMapping, ProviderFields, normalize};
pub use record::Record;
pub use service::ServiceKind;
pub use table::{Table, TableBuilder, format_date, parse_date};
pub use value::Value;

/// Column carried by every record regardless of service.
pub const ACCOUNT_ID: &str = "account_id";

/// Column carried by every record regardless of service.
pub const REGION: &str = "region";
