use super::api_error;
use crate::session::AwsSession;
use async_trait::async_trait;
use aws_sdk_rds::error::DisplayErrorContext;
use aws_sdk_rds::types::{DbInstance, Tag};
use skytally_cloud::{CloudSession, Collector, Result};
use skytally_core::{FieldMapping, ProviderFields, Record, ServiceKind, normalize};

pub static MAPPING: &[FieldMapping] = &[
    FieldMapping::new("DBInstanceIdentifier", "db_instance_id"),
    FieldMapping::new("Tags.Name", "name"),
    FieldMapping::new("DBClusterIdentifier", "cluster_id"),
    FieldMapping::new("Engine", "engine"),
    FieldMapping::new("EngineVersion", "engine_version"),
    FieldMapping::new("DBInstanceClass", "instance_class"),
    FieldMapping::new("DBInstanceStatus", "status"),
    FieldMapping::new("AvailabilityZone", "availability_zone"),
    FieldMapping::new("Endpoint.Address", "endpoint"),
    FieldMapping::new("Endpoint.Port", "port"),
    FieldMapping::new("DBSubnetGroup.VpcId", "vpc_id"),
    FieldMapping::new("BackupRetentionPeriod", "backup_retention_period").or_number(0.0),
];

/// RDS instances via `DescribeDBInstances`, with the `Name` tag.
#[derive(Debug, Default)]
pub struct RdsCollector;

fn name_tag(tags: &[Tag]) -> Option<&str> {
    tags.iter()
        .find(|t| t.key() == Some("Name"))
        .and_then(|t| t.value())
}

fn extract(db: &DbInstance, name: Option<&str>) -> ProviderFields {
    let endpoint = db.endpoint();
    ProviderFields::from([
        ("DBInstanceIdentifier", db.db_instance_identifier().into()),
        ("Tags.Name", name.into()),
        ("DBClusterIdentifier", db.db_cluster_identifier().into()),
        ("Engine", db.engine().into()),
        ("EngineVersion", db.engine_version().into()),
        ("DBInstanceClass", db.db_instance_class().into()),
        ("DBInstanceStatus", db.db_instance_status().into()),
        ("AvailabilityZone", db.availability_zone().into()),
        ("Endpoint.Address", endpoint.and_then(|e| e.address()).into()),
        ("Endpoint.Port", endpoint.and_then(|e| e.port()).into()),
        (
            "DBSubnetGroup.VpcId",
            db.db_subnet_group().and_then(|g| g.vpc_id()).into(),
        ),
        ("BackupRetentionPeriod", db.backup_retention_period().into()),
    ])
}

impl RdsCollector {
    /// `DescribeDBInstances` usually embeds the tag list; older responses
    /// need a separate `ListTagsForResource`. A failed lookup only loses
    /// the name.
    async fn lookup_name(client: &aws_sdk_rds::Client, db: &DbInstance) -> Option<String> {
        if let Some(name) = name_tag(db.tag_list()) {
            return Some(name.to_string());
        }
        let arn = db.db_instance_arn()?;
        match client.list_tags_for_resource().resource_name(arn).send().await {
            Ok(output) => name_tag(output.tag_list()).map(str::to_string),
            Err(e) => {
                tracing::warn!(
                    db_instance_id = db.db_instance_identifier().unwrap_or_default(),
                    error = %DisplayErrorContext(e),
                    "tag lookup failed"
                );
                None
            }
        }
    }
}

#[async_trait]
impl Collector<AwsSession> for RdsCollector {
    fn service(&self) -> ServiceKind {
        ServiceKind::Database
    }

    fn mapping(&self) -> &'static [FieldMapping] {
        MAPPING
    }

    async fn collect(&self, session: &AwsSession, region: &str) -> Result<Vec<Record>> {
        let client = aws_sdk_rds::Client::new(session.config());
        let mut pages = client.describe_db_instances().into_paginator().send();
        let mut records = Vec::new();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| api_error(self.service(), session, region, e))?;
            for db in page.db_instances() {
                let name = Self::lookup_name(&client, db).await;
                records.push(normalize(
                    MAPPING,
                    extract(db, name.as_deref()),
                    session.account_id(),
                    region,
                ));
            }
        }

        Ok(records)
    }
}
