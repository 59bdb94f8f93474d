use super::api_error;
use crate::regions;
use crate::session::AwsSession;
use async_trait::async_trait;
use aws_sdk_workspaces::types::Workspace;
use skytally_cloud::{CloudSession, Collector, Result};
use skytally_core::{FieldMapping, ProviderFields, Record, ServiceKind, normalize};

pub static MAPPING: &[FieldMapping] = &[
    FieldMapping::new("WorkspaceId", "workspace_id"),
    FieldMapping::new("UserName", "user_name"),
    FieldMapping::new("ComputerName", "computer_name"),
    FieldMapping::new("IpAddress", "ip_address"),
    FieldMapping::new("State", "state"),
    FieldMapping::new("BundleId", "bundle_id"),
    FieldMapping::new("DirectoryId", "directory_id"),
];

/// WorkSpaces via `DescribeWorkspaces` (NextToken paging).
#[derive(Debug, Default)]
pub struct WorkspacesCollector;

fn extract(workspace: &Workspace) -> ProviderFields {
    ProviderFields::from([
        ("WorkspaceId", workspace.workspace_id().into()),
        ("UserName", workspace.user_name().into()),
        ("ComputerName", workspace.computer_name().into()),
        ("IpAddress", workspace.ip_address().into()),
        ("State", workspace.state().map(|s| s.as_str()).into()),
        ("BundleId", workspace.bundle_id().into()),
        ("DirectoryId", workspace.directory_id().into()),
    ])
}

#[async_trait]
impl Collector<AwsSession> for WorkspacesCollector {
    fn service(&self) -> ServiceKind {
        ServiceKind::VirtualDesktop
    }

    fn mapping(&self) -> &'static [FieldMapping] {
        MAPPING
    }

    async fn collect(&self, session: &AwsSession, region: &str) -> Result<Vec<Record>> {
        if !regions::offers_virtual_desktop(region) {
            tracing::debug!(region, "WorkSpaces not offered in region, skipping");
            return Ok(Vec::new());
        }

        let client = aws_sdk_workspaces::Client::new(session.config());
        let mut pages = client.describe_workspaces().into_paginator().send();
        let mut records = Vec::new();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| api_error(self.service(), session, region, e))?;
            records.extend(page.workspaces().iter().map(|workspace| {
                normalize(MAPPING, extract(workspace), session.account_id(), region)
            }));
        }

        Ok(records)
    }
}
