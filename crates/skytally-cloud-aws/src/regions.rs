//! AWS region catalogue

use aws_config::SdkConfig;
use regex::Regex;
use skytally_cloud::{CloudError, Result};
use std::sync::LazyLock;

/// Commercial region catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionInfo {
    pub code: &'static str,
    pub display_name: &'static str,
    /// WorkSpaces is offered in this region
    pub virtual_desktop: bool,
}

const fn region(
    code: &'static str,
    display_name: &'static str,
    virtual_desktop: bool,
) -> RegionInfo {
    RegionInfo {
        code,
        display_name,
        virtual_desktop,
    }
}

pub static CATALOGUE: &[RegionInfo] = &[
    region("us-east-1", "US East (N. Virginia)", true),
    region("us-east-2", "US East (Ohio)", false),
    region("us-west-1", "US West (N. California)", false),
    region("us-west-2", "US West (Oregon)", true),
    region("ca-central-1", "Canada (Central)", true),
    region("sa-east-1", "South America (São Paulo)", true),
    region("eu-west-1", "Europe (Ireland)", true),
    region("eu-west-2", "Europe (London)", true),
    region("eu-west-3", "Europe (Paris)", false),
    region("eu-central-1", "Europe (Frankfurt)", true),
    region("eu-north-1", "Europe (Stockholm)", false),
    region("ap-northeast-1", "Asia Pacific (Tokyo)", true),
    region("ap-northeast-2", "Asia Pacific (Seoul)", true),
    region("ap-northeast-3", "Asia Pacific (Osaka)", false),
    region("ap-southeast-1", "Asia Pacific (Singapore)", true),
    region("ap-southeast-2", "Asia Pacific (Sydney)", true),
    region("ap-south-1", "Asia Pacific (Mumbai)", true),
];

pub const DEFAULT_REGION: &str = "ap-northeast-2";

static REGION_CODE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}(-gov|-iso[a-z]?)?-[a-z]+-\d{1,2}$").ok());

/// Default region set when configuration lists none.
pub fn default_regions() -> Vec<String> {
    CATALOGUE.iter().map(|r| r.code.to_string()).collect()
}

pub fn lookup(code: &str) -> Option<&'static RegionInfo> {
    CATALOGUE.iter().find(|r| r.code == code)
}

/// Human-readable name; unknown codes are returned unchanged.
pub fn display_name(code: &str) -> &str {
    lookup(code).map(|r| r.display_name).unwrap_or(code)
}

/// Syntactic check only; whether the account has the region enabled is
/// decided by STS.
pub fn is_valid_region_code(code: &str) -> bool {
    REGION_CODE.as_ref().is_some_and(|re| re.is_match(code))
}

/// Regions outside the catalogue are assumed to offer the service and left
/// to the API to reject.
pub fn offers_virtual_desktop(code: &str) -> bool {
    lookup(code).is_none_or(|r| r.virtual_desktop)
}

/// Ask the compute API which regions are enabled for the caller.
pub async fn discover_regions(config: &SdkConfig) -> Result<Vec<String>> {
    let home = config
        .region()
        .map(|r| r.to_string())
        .unwrap_or_else(|| DEFAULT_REGION.to_string());

    let client = aws_sdk_ec2::Client::new(config);
    let output = client
        .describe_regions()
        .send()
        .await
        .map_err(|e| CloudError::region(&home, aws_sdk_ec2::error::DisplayErrorContext(e)))?;

    let mut regions: Vec<String> = output
        .regions()
        .iter()
        .filter_map(|r| r.region_name())
        .map(str::to_string)
        .collect();
    regions.sort();

    tracing::debug!(count = regions.len(), "regions discovered");
    Ok(regions)
}
