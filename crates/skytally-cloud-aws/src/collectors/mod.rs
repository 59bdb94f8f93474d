//! Inventory collectors, one per service

mod ec2;
mod rds;
mod s3;
mod workspaces;

pub use ec2::Ec2Collector;
pub use rds::RdsCollector;
pub use s3::S3Collector;
pub use workspaces::WorkspacesCollector;

use crate::session::AwsSession;
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::primitives::DateTime as SmithyDateTime;
use chrono::{DateTime, Utc};
use skytally_cloud::{CloudError, CloudSession, Collector, CollectorRegistry};
use skytally_core::{ServiceKind, Value};

/// The AWS collector set.
#[derive(Debug, Default)]
pub struct AwsCollectors {
    ec2: Ec2Collector,
    s3: S3Collector,
    rds: RdsCollector,
    workspaces: WorkspacesCollector,
}

impl AwsCollectors {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CollectorRegistry<AwsSession> for AwsCollectors {
    fn collector(&self, service: ServiceKind) -> &dyn Collector<AwsSession> {
        match service {
            ServiceKind::Compute => &self.ec2,
            ServiceKind::ObjectStorage => &self.s3,
            ServiceKind::Database => &self.rds,
            ServiceKind::VirtualDesktop => &self.workspaces,
        }
    }
}

/// SDK timestamps share one type across service crates.
pub(crate) fn timestamp(value: Option<&SmithyDateTime>) -> Value {
    value
        .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos()))
        .into()
}

pub(crate) fn api_error<E>(
    service: ServiceKind,
    session: &AwsSession,
    region: &str,
    error: E,
) -> CloudError
where
    E: std::error::Error,
{
    CloudError::collection(
        service,
        session.account_id(),
        region,
        DisplayErrorContext(error),
    )
}
