use datazone_pipeline_core::custom_resource::CustomResourceResponse;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tracing::info;

use super::block_on;

pub trait ResponseSender {
    fn send(&self, response_url: &str, response: &CustomResourceResponse) -> Result<(), String>;
}

/// PUTs the response document to CloudFormation's pre-signed S3 URL.
///
/// The URL is signed without a content type, so the header is sent empty.
#[derive(Debug, Clone, Default)]
pub struct HttpResponseSender {
    http_client: reqwest::Client,
}

impl HttpResponseSender {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

impl ResponseSender for HttpResponseSender {
    fn send(&self, response_url: &str, response: &CustomResourceResponse) -> Result<(), String> {
        let body = serde_json::to_string(response)
            .map_err(|error| format!("failed to serialize custom resource response: {error}"))?;
        info!(
            component = "cfn_response",
            event = "response_body",
            body = %body,
        );

        let request = self
            .http_client
            .put(response_url)
            .header(CONTENT_TYPE, "")
            .header(CONTENT_LENGTH, body.len().to_string())
            .body(body);

        let status = block_on(request.send())
            .map_err(|error| format!("failed to PUT custom resource response: {error}"))?
            .status();
        info!(
            component = "cfn_response",
            event = "response_status",
            status_code = status.as_u16(),
            status_message = status.canonical_reason().unwrap_or(""),
        );

        if !status.is_success() {
            return Err(format!(
                "custom resource response rejected with status {status}"
            ));
        }
        Ok(())
    }
}
