use super::{api_error, timestamp};
use crate::session::AwsSession;
use async_trait::async_trait;
use aws_sdk_s3::types::Bucket;
use skytally_cloud::{CloudSession, Collector, Result};
use skytally_core::{FieldMapping, ProviderFields, Record, ServiceKind, normalize};

pub static MAPPING: &[FieldMapping] = &[
    FieldMapping::new("Name", "bucket_name"),
    FieldMapping::new("CreationDate", "creation_date"),
];

const PAGE_SIZE: i32 = 1000;

/// S3 buckets via `ListBuckets`. Buckets are account-global, so this runs
/// once per account in the default region.
#[derive(Debug, Default)]
pub struct S3Collector;

fn extract(bucket: &Bucket) -> ProviderFields {
    ProviderFields::from([
        ("Name", bucket.name().into()),
        ("CreationDate", timestamp(bucket.creation_date())),
    ])
}

/// A bucket lives in its own region; fall back to the session region when
/// the API does not report it.
fn bucket_region<'a>(bucket: &'a Bucket, session_region: &'a str) -> &'a str {
    bucket
        .bucket_region()
        .filter(|r| !r.is_empty())
        .unwrap_or(session_region)
}

#[async_trait]
impl Collector<AwsSession> for S3Collector {
    fn service(&self) -> ServiceKind {
        ServiceKind::ObjectStorage
    }

    fn mapping(&self) -> &'static [FieldMapping] {
        MAPPING
    }

    async fn collect(&self, session: &AwsSession, region: &str) -> Result<Vec<Record>> {
        let client = aws_sdk_s3::Client::new(session.config());
        let mut records = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let page = client
                .list_buckets()
                .max_buckets(PAGE_SIZE)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| api_error(self.service(), session, region, e))?;

            for bucket in page.buckets() {
                records.push(normalize(
                    MAPPING,
                    extract(bucket),
                    session.account_id(),
                    bucket_region(bucket, region),
                ));
            }

            match page.continuation_token() {
                Some(token) if !token.is_empty() => continuation = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(records)
    }
}
