use datazone_pipeline_core::custom_resource::{
    grant_physical_resource_id, CustomResourceEvent, CustomResourceResponse, RawEnvelope,
    ReconciliationResult, RequestType,
};
use datazone_pipeline_core::grant_request::{PolicyGrant, PolicyGrantRequest};
use datazone_pipeline_core::retry::{
    run_with_retry, ApplyOutcome, RetrySchedule, ADD_GRANT_SCHEDULE, REMOVE_GRANT_SCHEDULE,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::adapters::callback::ResponseSender;
use crate::adapters::grant_api::PolicyGrantApi;
use crate::adapters::sleep::Sleeper;
use crate::config::PolicyGrantSettings;

const COMPONENT: &str = "policy_grant_handler";

pub const GRANT_ADDED_MESSAGE: &str = "Policy grant added/updated successfully";
pub const GRANT_REMOVED_MESSAGE: &str = "Policy grant removed successfully";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("Failed to send custom resource response: {0}")]
    Send(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GrantOperation {
    Add,
    Remove,
}

impl GrantOperation {
    fn for_request(request_type: RequestType) -> Self {
        match request_type {
            RequestType::Create | RequestType::Update => Self::Add,
            RequestType::Delete => Self::Remove,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Add => "AddPolicyGrant",
            Self::Remove => "RemovePolicyGrant",
        }
    }

    fn schedule(self) -> &'static RetrySchedule {
        match self {
            Self::Add => &ADD_GRANT_SCHEDULE,
            Self::Remove => &REMOVE_GRANT_SCHEDULE,
        }
    }
}

/// Full custom resource lifecycle for one invocation: reconcile the grant and
/// send exactly one response to CloudFormation.
///
/// Only a failed callback escapes as an error; every other failure is folded
/// into a FAILED [`ReconciliationResult`].
pub fn handle_policy_grant_event(
    event: &CustomResourceEvent,
    log_stream_name: &str,
    settings: &PolicyGrantSettings,
    api: &impl PolicyGrantApi,
    sleeper: &dyn Sleeper,
    sender: &impl ResponseSender,
) -> Result<ReconciliationResult, ReportError> {
    let properties = Value::Object(event.resource_properties.clone());
    info!(
        component = COMPONENT,
        event = "event_received",
        request_type = event.request_type.as_str(),
        logical_resource_id = event.logical_resource_id.as_deref().unwrap_or(""),
        properties = %properties,
    );

    if !settings.readiness_delay.is_zero() {
        info!(
            component = COMPONENT,
            event = "readiness_delay",
            delay_seconds = settings.readiness_delay.as_secs(),
        );
        sleeper.sleep(settings.readiness_delay);
    }

    let result = reconcile(event, log_stream_name, settings, api, sleeper);
    report_result(event, &result, log_stream_name, sender)?;
    Ok(result)
}

pub fn reconcile(
    event: &CustomResourceEvent,
    log_stream_name: &str,
    settings: &PolicyGrantSettings,
    api: &impl PolicyGrantApi,
    sleeper: &dyn Sleeper,
) -> ReconciliationResult {
    let grant = match PolicyGrantRequest::from_properties(&event.resource_properties)
        .and_then(|request| request.resolve())
    {
        Ok(grant) => grant,
        Err(invalid) => {
            warn!(
                component = COMPONENT,
                event = "validation_failed",
                request_type = event.request_type.as_str(),
                error = %invalid,
            );
            return ReconciliationResult::failed(
                existing_physical_id(event, log_stream_name),
                invalid.to_string(),
            );
        }
    };

    let physical_resource_id = match event.request_type {
        RequestType::Delete => existing_physical_id(event, log_stream_name),
        RequestType::Create | RequestType::Update => grant_physical_resource_id(&grant),
    };

    let operation = GrantOperation::for_request(event.request_type);
    let outcome = apply_grant(event.request_type, &grant, api, sleeper);

    match outcome {
        ApplyOutcome::Applied { .. } => match operation {
            GrantOperation::Add => {
                ReconciliationResult::success(physical_resource_id, GRANT_ADDED_MESSAGE)
            }
            GrantOperation::Remove => {
                ReconciliationResult::success(physical_resource_id, GRANT_REMOVED_MESSAGE)
            }
        },
        ApplyOutcome::Exhausted {
            attempts,
            last_error,
        } => {
            let message = format!(
                "{} failed after {attempts} attempts: {last_error}",
                operation.name()
            );
            if operation == GrantOperation::Remove && !settings.fail_on_exhausted_delete {
                // A stuck delete would wedge the stack; leave the orphaned grant
                // for the operator.
                ReconciliationResult::success_with_warning(physical_resource_id, message)
            } else {
                ReconciliationResult::failed(physical_resource_id, message)
            }
        }
    }
}

/// Calls AddPolicyGrant (Create/Update) or RemovePolicyGrant (Delete) under
/// the operation's retry schedule. Never fails; exhaustion is an outcome.
pub fn apply_grant(
    request_type: RequestType,
    grant: &PolicyGrant,
    api: &impl PolicyGrantApi,
    sleeper: &dyn Sleeper,
) -> ApplyOutcome {
    let operation = GrantOperation::for_request(request_type);
    info!(
        component = COMPONENT,
        event = "grant_started",
        operation = operation.name(),
        domain_id = %grant.domain_id,
        entity_id = %grant.entity_id,
        entity_type = %grant.entity_type,
        policy_type = %grant.policy_type,
        principal = %serde_json::to_string(&grant.principal).unwrap_or_default(),
        include_child_domain_units = ?grant.detail.include_child_domain_units(),
    );

    let outcome = run_with_retry(
        operation.schedule(),
        sleeper,
        |_| match operation {
            GrantOperation::Add => api.add_policy_grant(grant),
            GrantOperation::Remove => api.remove_policy_grant(grant),
        },
        |attempt, error, delay| match delay {
            Some(delay) => warn!(
                component = COMPONENT,
                event = "attempt_failed",
                operation = operation.name(),
                attempt,
                retry_in_seconds = delay.as_secs(),
                error,
            ),
            None => warn!(
                component = COMPONENT,
                event = "attempt_failed",
                operation = operation.name(),
                attempt,
                error,
            ),
        },
    );

    match &outcome {
        ApplyOutcome::Applied { attempts } => info!(
            component = COMPONENT,
            event = "grant_applied",
            operation = operation.name(),
            attempts,
        ),
        ApplyOutcome::Exhausted {
            attempts,
            last_error,
        } => warn!(
            component = COMPONENT,
            event = "grant_exhausted",
            operation = operation.name(),
            attempts,
            last_error = %last_error,
        ),
    }
    outcome
}

/// Sends the terminal response. Without a `ResponseURL` (direct or local
/// invocation) nothing is sent.
pub fn report_result(
    event: &CustomResourceEvent,
    result: &ReconciliationResult,
    log_stream_name: &str,
    sender: &impl ResponseSender,
) -> Result<(), ReportError> {
    let Some(response_url) = event
        .response_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
    else {
        warn!(
            component = COMPONENT,
            event = "response_skipped",
            "No ResponseURL found in event, assuming local testing or direct Lambda invocation"
        );
        return Ok(());
    };

    let response = CustomResourceResponse::new(event, result, log_stream_name);
    sender.send(response_url, &response).map_err(|message| {
        error!(
            component = COMPONENT,
            event = "response_failed",
            error = %message,
        );
        ReportError::Send(message)
    })?;

    info!(
        component = COMPONENT,
        event = "response_sent",
        status = ?result.status,
        physical_resource_id = %result.physical_resource_id,
    );
    Ok(())
}

/// Answers an invocation whose envelope could not be deserialized, so the
/// stack fails fast instead of waiting out the custom resource timeout.
pub fn report_malformed_event(
    payload: &Value,
    error: &str,
    log_stream_name: &str,
    sender: &impl ResponseSender,
) -> Result<ReconciliationResult, ReportError> {
    let raw = RawEnvelope::from_value(payload);
    warn!(
        component = COMPONENT,
        event = "malformed_event",
        error = %error,
        has_response_url = raw.response_url.is_some(),
    );

    let result = ReconciliationResult::failed(
        raw.physical_resource_id
            .clone()
            .unwrap_or_else(|| log_stream_name.to_string()),
        format!("Invalid custom resource event: {error}"),
    );
    let Some(response_url) = raw.response_url.as_deref() else {
        return Ok(result);
    };

    let response =
        CustomResourceResponse::for_request(raw.target.clone(), &result, log_stream_name);
    sender
        .send(response_url, &response)
        .map_err(ReportError::Send)?;
    info!(
        component = COMPONENT,
        event = "response_sent",
        status = ?result.status,
        physical_resource_id = %result.physical_resource_id,
    );
    Ok(result)
}

fn existing_physical_id(event: &CustomResourceEvent, log_stream_name: &str) -> String {
    event
        .physical_resource_id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| log_stream_name.to_string())
}
