use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use crate::grant_request::PolicyGrant;

pub const PHYSICAL_ID_PREFIX: &str = "policy-grant-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl RequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}

/// CloudFormation custom resource request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceEvent {
    pub request_type: RequestType,
    #[serde(rename = "ResponseURL", default)]
    pub response_url: Option<String>,
    #[serde(default)]
    pub stack_id: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub logical_resource_id: Option<String>,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub resource_properties: Map<String, Value>,
    #[serde(default)]
    pub old_resource_properties: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

/// Terminal result of one invocation, sent exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationResult {
    pub status: ResponseStatus,
    pub physical_resource_id: String,
    pub data: BTreeMap<String, String>,
}

impl ReconciliationResult {
    pub fn success(physical_resource_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            physical_resource_id: physical_resource_id.into(),
            data: BTreeMap::from([("Message".to_string(), message.into())]),
        }
    }

    pub fn failed(physical_resource_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Failed,
            physical_resource_id: physical_resource_id.into(),
            data: BTreeMap::from([("Error".to_string(), error.into())]),
        }
    }

    /// Success that still carries a warning for the stack operator.
    pub fn success_with_warning(
        physical_resource_id: impl Into<String>,
        warning: impl Into<String>,
    ) -> Self {
        Self {
            status: ResponseStatus::Success,
            physical_resource_id: physical_resource_id.into(),
            data: BTreeMap::from([("Warning".to_string(), warning.into())]),
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.data.get("Error").map(String::as_str)
    }
}

/// Identifiers CloudFormation needs to correlate a response with its request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseTarget {
    pub stack_id: Option<String>,
    pub request_id: Option<String>,
    pub logical_resource_id: Option<String>,
}

/// Correlation fields read from an envelope that failed to deserialize, so a
/// FAILED response can still reach CloudFormation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEnvelope {
    pub response_url: Option<String>,
    pub physical_resource_id: Option<String>,
    pub target: ResponseTarget,
}

impl RawEnvelope {
    pub fn from_value(payload: &Value) -> Self {
        let field = |name: &str| {
            payload
                .get(name)
                .and_then(Value::as_str)
                .filter(|text| !text.trim().is_empty())
                .map(str::to_string)
        };
        Self {
            response_url: field("ResponseURL"),
            physical_resource_id: field("PhysicalResourceId"),
            target: ResponseTarget {
                stack_id: field("StackId"),
                request_id: field("RequestId"),
                logical_resource_id: field("LogicalResourceId"),
            },
        }
    }
}

/// Response document PUT to the pre-signed `ResponseURL`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceResponse {
    pub status: ResponseStatus,
    pub reason: String,
    pub physical_resource_id: String,
    pub stack_id: Option<String>,
    pub request_id: Option<String>,
    pub logical_resource_id: Option<String>,
    pub no_echo: bool,
    pub data: BTreeMap<String, String>,
}

impl CustomResourceResponse {
    pub fn new(
        event: &CustomResourceEvent,
        result: &ReconciliationResult,
        log_stream_name: &str,
    ) -> Self {
        Self::for_request(
            ResponseTarget {
                stack_id: event.stack_id.clone(),
                request_id: event.request_id.clone(),
                logical_resource_id: event.logical_resource_id.clone(),
            },
            result,
            log_stream_name,
        )
    }

    pub fn for_request(
        target: ResponseTarget,
        result: &ReconciliationResult,
        log_stream_name: &str,
    ) -> Self {
        let pointer = format!("See the details in CloudWatch Log Stream: {log_stream_name}");
        let reason = match result.error() {
            Some(error) if result.status == ResponseStatus::Failed => format!("{error}. {pointer}"),
            _ => pointer,
        };

        Self {
            status: result.status,
            reason,
            physical_resource_id: result.physical_resource_id.clone(),
            stack_id: target.stack_id,
            request_id: target.request_id,
            logical_resource_id: target.logical_resource_id,
            no_echo: false,
            data: result.data.clone(),
        }
    }
}

/// Stable identity of a grant, used as the physical resource id so that an
/// Update with unchanged properties never triggers a replacement.
pub fn grant_physical_resource_id(grant: &PolicyGrant) -> String {
    let identity = json!({
        "domain": grant.domain_id,
        "entity": grant.entity_id,
        "entity_type": grant.entity_type,
        "policy_type": grant.policy_type,
        "principal": grant.principal,
    });
    let mut hasher = Sha256::new();
    hasher.update(identity.to_string());
    let digest = format!("{:x}", hasher.finalize());
    format!("{PHYSICAL_ID_PREFIX}{}", &digest[..16])
}
