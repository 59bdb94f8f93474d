use super::{api_error, timestamp};
use crate::session::AwsSession;
use async_trait::async_trait;
use aws_sdk_ec2::types::Instance;
use skytally_cloud::{CloudSession, Collector, Result};
use skytally_core::{FieldMapping, ProviderFields, Record, ServiceKind, normalize};

pub static MAPPING: &[FieldMapping] = &[
    FieldMapping::new("InstanceId", "instance_id"),
    FieldMapping::new("Tags.Name", "name"),
    FieldMapping::new("InstanceType", "instance_type"),
    FieldMapping::new("State.Name", "state"),
    FieldMapping::new("Platform", "platform").or_text("Linux"),
    FieldMapping::new("Placement.AvailabilityZone", "availability_zone"),
    FieldMapping::new("PrivateIpAddress", "private_ip"),
    FieldMapping::new("PublicIpAddress", "public_ip"),
    FieldMapping::new("SecurityGroups", "security_groups"),
    FieldMapping::new("LaunchTime", "launch_time"),
];

/// EC2 instances via `DescribeInstances`.
#[derive(Debug, Default)]
pub struct Ec2Collector;

fn extract(instance: &Instance) -> ProviderFields {
    let name = instance
        .tags()
        .iter()
        .find(|t| t.key() == Some("Name"))
        .and_then(|t| t.value());

    let security_groups = instance
        .security_groups()
        .iter()
        .map(|g| {
            format!(
                "{}({})",
                g.group_name().unwrap_or_default(),
                g.group_id().unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    ProviderFields::from([
        ("InstanceId", instance.instance_id().into()),
        ("Tags.Name", name.into()),
        (
            "InstanceType",
            instance.instance_type().map(|t| t.as_str()).into(),
        ),
        (
            "State.Name",
            instance
                .state()
                .and_then(|s| s.name())
                .map(|n| n.as_str())
                .into(),
        ),
        ("Platform", instance.platform().map(|p| p.as_str()).into()),
        (
            "Placement.AvailabilityZone",
            instance
                .placement()
                .and_then(|p| p.availability_zone())
                .into(),
        ),
        ("PrivateIpAddress", instance.private_ip_address().into()),
        ("PublicIpAddress", instance.public_ip_address().into()),
        ("SecurityGroups", security_groups.into()),
        ("LaunchTime", timestamp(instance.launch_time())),
    ])
}

#[async_trait]
impl Collector<AwsSession> for Ec2Collector {
    fn service(&self) -> ServiceKind {
        ServiceKind::Compute
    }

    fn mapping(&self) -> &'static [FieldMapping] {
        MAPPING
    }

    async fn collect(&self, session: &AwsSession, region: &str) -> Result<Vec<Record>> {
        let client = aws_sdk_ec2::Client::new(session.config());
        let mut pages = client.describe_instances().into_paginator().send();
        let mut records = Vec::new();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| api_error(self.service(), session, region, e))?;
            for reservation in page.reservations() {
                for instance in reservation.instances() {
                    records.push(normalize(
                        MAPPING,
                        extract(instance),
                        session.account_id(),
                        region,
                    ));
                }
            }
        }

        Ok(records)
    }
}
