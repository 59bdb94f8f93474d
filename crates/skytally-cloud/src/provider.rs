//! Provider abstraction traits
//!
//! A provider supplies two things: a [`SessionFactory`] that turns
//! (account, region) into an authenticated session, and a
//! [`CollectorRegistry`] that hands out one [`Collector`] per service.

use crate::error::Result;
use async_trait::async_trait;
use skytally_core::{AccountRef, FieldMapping, Record, ServiceKind};

/// Authenticated handle bound to one (account, region).
pub trait CloudSession: Send + Sync {
    fn account_id(&self) -> &str;

    fn region(&self) -> &str;
}

/// Produces region-scoped sessions. No retries at this layer.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: CloudSession;

    /// Returns the provider name (e.g., "aws")
    fn name(&self) -> &str;

    /// Fails with `CloudError::Auth` when role assumption is rejected and
    /// `CloudError::Region` when the region is unusable.
    async fn acquire(&self, account: &AccountRef, region: &str) -> Result<Self::Session>;
}

/// Retrieves and normalizes one resource family's inventory.
#[async_trait]
pub trait Collector<S: CloudSession>: Send + Sync {
    fn service(&self) -> ServiceKind;

    /// Static provider-field → column mapping table.
    fn mapping(&self) -> &'static [FieldMapping];

    /// Normalized column order.
    fn columns(&self) -> Vec<String> {
        FieldMapping::columns(self.mapping())
    }

    /// Page through the provider exhaustively. Returns either every record
    /// or an error; partial results are never returned.
    async fn collect(&self, session: &S, region: &str) -> Result<Vec<Record>>;
}

/// One collector per service. Implementations should `match` over
/// [`ServiceKind`] so that a new service fails to compile until handled.
pub trait CollectorRegistry<S: CloudSession>: Send + Sync {
    fn collector(&self, service: ServiceKind) -> &dyn Collector<S>;
}
