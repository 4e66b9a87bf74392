use datazone_pipeline_lambda::adapters::catalog::DataZoneCatalogReader;
use datazone_pipeline_lambda::adapters::notifier::SnsNotifier;
use datazone_pipeline_lambda::adapters::object_store::S3ObjectStore;
use datazone_pipeline_lambda::config::AssetMetadataSettings;
use datazone_pipeline_lambda::handlers::asset_metadata::{
    handle_catalog_event, NotificationResponse,
};
use datazone_pipeline_lambda::telemetry::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

async fn handle_request(event: LambdaEvent<Value>) -> Result<NotificationResponse, Error> {
    let settings = AssetMetadataSettings::from_env().map_err(Error::from)?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let catalog = DataZoneCatalogReader::new(aws_sdk_datazone::Client::new(&aws_config));
    let store = S3ObjectStore::new(aws_sdk_s3::Client::new(&aws_config));
    let notifier = SnsNotifier::new(aws_sdk_sns::Client::new(&aws_config));

    handle_catalog_event(&event.payload, &settings, &catalog, &store, &notifier)
        .map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();
    lambda_runtime::run(service_fn(handle_request)).await
}
