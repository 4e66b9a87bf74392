use datazone_pipeline_core::custom_resource::CustomResourceEvent;
use datazone_pipeline_lambda::adapters::callback::HttpResponseSender;
use datazone_pipeline_lambda::adapters::grant_api::DataZoneGrantApi;
use datazone_pipeline_lambda::adapters::sleep::BlockingSleeper;
use datazone_pipeline_lambda::config::PolicyGrantSettings;
use datazone_pipeline_lambda::handlers::policy_grant::{
    handle_policy_grant_event, report_malformed_event,
};
use datazone_pipeline_lambda::telemetry::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::{json, Value};

async fn handle_request(event: LambdaEvent<Value>) -> Result<Value, Error> {
    let (payload, context) = event.into_parts();
    let log_stream_name = context.env_config.log_stream.clone();
    let event: CustomResourceEvent = match serde_json::from_value(payload.clone()) {
        Ok(event) => event,
        Err(error) => {
            let message = error.to_string();
            report_malformed_event(
                &payload,
                &message,
                &log_stream_name,
                &HttpResponseSender::default(),
            )
            .map_err(Error::from)?;
            return Err(Error::from(format!(
                "invalid custom resource event: {message}"
            )));
        }
    };
    let settings = PolicyGrantSettings::from_env().map_err(Error::from)?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let api = DataZoneGrantApi::new(aws_sdk_datazone::Client::new(&aws_config));
    let sender = HttpResponseSender::default();

    let result = handle_policy_grant_event(
        &event,
        &log_stream_name,
        &settings,
        &api,
        &BlockingSleeper,
        &sender,
    )
    .map_err(Error::from)?;

    Ok(json!({
        "Status": result.status,
        "PhysicalResourceId": result.physical_resource_id,
        "Data": result.data,
    }))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();
    lambda_runtime::run(service_fn(handle_request)).await
}
