//! Skytally Cloud
//!
//! Provider abstraction and the parallel collection scheduler.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  skytally CLI                    │
//! │                 (skytally collect)               │
//! └─────────────────┬───────────────────────────────┘
//!                   │ Selection
//! ┌─────────────────▼───────────────────────────────┐
//! │               skytally-cloud                     │
//! │  ┌──────────────┐  ┌──────────────────────────┐ │
//! │  │   WorkPlan   │─▶│ Aggregator (JoinSet +    │ │
//! │  │ acct×reg×svc │  │ Semaphore, per-unit      │ │
//! │  └──────────────┘  │ timeout)                 │ │
//! │                    └────────────┬─────────────┘ │
//! │  trait SessionFactory           │ RunSummary    │
//! │  trait Collector / Registry     ▼               │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────────┐
//! │ skytally-cloud-aws│
//! │  STS + SDK pagers │
//! └───────────────────┘
//! ```

pub mod error;
pub mod plan;
pub mod provider;
pub mod scheduler;
pub mod summary;

// Re-exports
pub use error::{CloudError, Result};
pub use plan::{Selection, UnitCoordinates, WorkPlan, WorkUnit};
pub use provider::{CloudSession, Collector, CollectorRegistry, SessionFactory};
pub use scheduler::{
    Aggregator, AggregatorOptions, DEFAULT_CONCURRENCY, DEFAULT_UNIT_TIMEOUT, ProgressSink,
};
pub use summary::{AccountSummary, RunSummary, ServiceOutcome, UnitFailure};
