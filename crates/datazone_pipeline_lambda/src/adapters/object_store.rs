use std::collections::BTreeMap;
use std::time::Duration;

use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;

use super::block_on;

pub trait ObjectStore {
    fn write_object(
        &self,
        bucket: &str,
        key: &str,
        body: &[u8],
        content_type: &str,
        metadata: &BTreeMap<String, String>,
    ) -> Result<(), String>;

    fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, String>;
}

pub struct S3ObjectStore {
    s3_client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(s3_client: aws_sdk_s3::Client) -> Self {
        Self { s3_client }
    }
}

impl ObjectStore for S3ObjectStore {
    fn write_object(
        &self,
        bucket: &str,
        key: &str,
        body: &[u8],
        content_type: &str,
        metadata: &BTreeMap<String, String>,
    ) -> Result<(), String> {
        let mut request = self
            .s3_client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body.to_vec()));
        for (name, value) in metadata {
            request = request.metadata(name, value);
        }

        block_on(request.send()).map(|_| ()).map_err(|error| {
            format!(
                "failed to write s3://{bucket}/{key}: {}",
                aws_sdk_s3::error::DisplayErrorContext(&error)
            )
        })
    }

    fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, String> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|error| format!("invalid presigning window {expires_in:?}: {error}"))?;
        let request = self.s3_client.get_object().bucket(bucket).key(key);

        block_on(request.presigned(presigning))
            .map(|presigned| presigned.uri().to_string())
            .map_err(|error| {
                format!(
                    "failed to presign s3://{bucket}/{key}: {}",
                    aws_sdk_s3::error::DisplayErrorContext(&error)
                )
            })
    }
}
