pub mod collect;
pub mod diff;
pub mod regions;
pub mod validate;
