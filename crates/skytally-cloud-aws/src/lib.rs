//! Skytally AWS provider
//!
//! Session factory (STS AssumeRole into each account) and the four inventory
//! collectors: EC2, S3, RDS and WorkSpaces. All provider calls are read-only
//! describe/list operations.

pub mod collectors;
pub mod regions;
pub mod session;

// Re-exports
pub use collectors::{AwsCollectors, Ec2Collector, RdsCollector, S3Collector, WorkspacesCollector};
pub use regions::{
    CATALOGUE, DEFAULT_REGION, RegionInfo, default_regions, discover_regions, display_name,
    is_valid_region_code,
};
pub use session::{AwsSession, AwsSessionFactory, DEFAULT_SESSION_NAME};
