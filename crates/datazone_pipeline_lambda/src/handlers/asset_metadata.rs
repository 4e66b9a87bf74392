use datazone_pipeline_core::asset_metadata::{
    default_metadata_bucket, default_notification_topic, metadata_object_key, object_metadata,
    AssetLocation, AssetMetadata, CatalogEvent, NOTIFICATION_SUBJECT,
};
use datazone_pipeline_core::error::MetadataError;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::adapters::catalog::CatalogReader;
use crate::adapters::notifier::Notifier;
use crate::adapters::object_store::ObjectStore;
use crate::config::AssetMetadataSettings;

const COMPONENT: &str = "asset_metadata_handler";
const CSV_CONTENT_TYPE: &str = "text/csv";

pub const PUBLISHED_MESSAGE: &str = "Message published successfully!";

/// API Gateway style reply; `body` is always a JSON-encoded string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl NotificationResponse {
    fn new(status_code: u16, message: &str) -> Self {
        Self {
            status_code,
            body: Value::String(message.to_string()).to_string(),
        }
    }
}

pub fn handle_catalog_event(
    event: &Value,
    settings: &AssetMetadataSettings,
    catalog: &impl CatalogReader,
    store: &impl ObjectStore,
    notifier: &impl Notifier,
) -> Result<NotificationResponse, MetadataError> {
    let catalog_event = match CatalogEvent::from_event(event) {
        Ok(catalog_event) => catalog_event,
        Err(rejected) if rejected.is_client_error() => {
            warn!(component = COMPONENT, event = "event_rejected", error = %rejected);
            return Ok(NotificationResponse::new(400, &rejected.to_string()));
        }
        Err(other) => return Err(other),
    };
    info!(
        component = COMPONENT,
        event = "event_received",
        detail_type = %catalog_event.detail_type,
        asset_id = %catalog_event.asset_id,
        domain_id = %catalog_event.domain_id,
        project_id = %catalog_event.project_id,
        user_id = catalog_event.user_id.as_deref().unwrap_or(""),
        create_date = ?catalog_event.create_date,
    );

    let bucket = resolve_target(
        settings.bucket.as_deref(),
        &catalog_event,
        default_metadata_bucket,
    )?;
    let topic_arn = resolve_target(
        settings.topic_arn.as_deref(),
        &catalog_event,
        default_notification_topic,
    )?;

    let (location, metadata) = load_asset(&catalog_event, catalog)?;
    let key = metadata_object_key(&location);
    let csv = metadata.to_csv()?;
    let user_metadata = object_metadata(&catalog_event, &metadata);

    store
        .write_object(&bucket, &key, &csv, CSV_CONTENT_TYPE, &user_metadata)
        .map_err(MetadataError::Storage)?;
    info!(
        component = COMPONENT,
        event = "metadata_written",
        bucket = %bucket,
        key = %key,
        columns = metadata.columns.len(),
        revision = %metadata.revision,
    );

    let url = store
        .presigned_get_url(&bucket, &key, settings.presigned_url_ttl)
        .map_err(MetadataError::Storage)?;

    match notifier.publish(&topic_arn, NOTIFICATION_SUBJECT, &url) {
        Ok(message_id) => {
            info!(
                component = COMPONENT,
                event = "notification_published",
                topic_arn = %topic_arn,
                message_id = message_id.as_deref().unwrap_or(""),
            );
            Ok(NotificationResponse::new(200, PUBLISHED_MESSAGE))
        }
        Err(message) => {
            error!(
                component = COMPONENT,
                event = "notification_failed",
                topic_arn = %topic_arn,
                error = %message,
            );
            Ok(NotificationResponse::new(
                500,
                &format!("Error publishing message: {message}"),
            ))
        }
    }
}

fn load_asset(
    catalog_event: &CatalogEvent,
    catalog: &impl CatalogReader,
) -> Result<(AssetLocation, AssetMetadata), MetadataError> {
    let domain_id = catalog_event.domain_id.as_str();

    let project = catalog
        .get_project(domain_id, &catalog_event.project_id)
        .map_err(MetadataError::Catalog)?;
    let domain_unit_id = project.domain_unit_id.as_deref().ok_or_else(|| {
        MetadataError::Catalog(format!(
            "project {} has no owning domain unit",
            catalog_event.project_id
        ))
    })?;
    let domain_unit_name = catalog
        .get_domain_unit_name(domain_id, domain_unit_id)
        .map_err(MetadataError::Catalog)?;
    let domain_name = catalog
        .get_domain_name(domain_id)
        .map_err(MetadataError::Catalog)?;
    let record = catalog
        .get_asset(domain_id, &catalog_event.asset_id)
        .map_err(MetadataError::Catalog)?;

    let metadata = AssetMetadata::from_record(record)?;
    let location = AssetLocation {
        domain_name,
        domain_unit_name,
        project_name: project.name,
        asset_name: metadata.name.clone(),
    };
    Ok((location, metadata))
}

fn resolve_target(
    configured: Option<&str>,
    catalog_event: &CatalogEvent,
    default_for: fn(&str, &str) -> String,
) -> Result<String, MetadataError> {
    if let Some(configured) = configured {
        return Ok(configured.to_string());
    }
    let account = catalog_event
        .account
        .as_deref()
        .ok_or(MetadataError::MissingField("account"))?;
    let region = catalog_event
        .region
        .as_deref()
        .ok_or(MetadataError::MissingField("region"))?;
    Ok(default_for(account, region))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use datazone_pipeline_core::asset_metadata::{AssetForm, AssetRecord};
    use serde_json::json;

    use super::*;
    use crate::adapters::catalog::ProjectSummary;

    struct FixedCatalog;

    impl CatalogReader for FixedCatalog {
        fn get_project(&self, _: &str, _: &str) -> Result<ProjectSummary, String> {
            Ok(ProjectSummary {
                name: "ledger".to_string(),
                domain_unit_id: Some("unit-1".to_string()),
            })
        }

        fn get_domain_unit_name(&self, _: &str, _: &str) -> Result<String, String> {
            Ok("finance".to_string())
        }

        fn get_domain_name(&self, _: &str) -> Result<String, String> {
            Ok("corp".to_string())
        }

        fn get_asset(&self, _: &str, _: &str) -> Result<AssetRecord, String> {
            Ok(AssetRecord {
                name: "orders".to_string(),
                revision: "1".to_string(),
                forms: vec![
                    AssetForm {
                        form_name: "AssetCommonDetailsForm".to_string(),
                        content: Some("{}".to_string()),
                    },
                    AssetForm {
                        form_name: "ColumnBusinessMetadataForm".to_string(),
                        content: Some(
                            r#"{"columnsBusinessMetadata":[{"columnIdentifier":"id"}]}"#
                                .to_string(),
                        ),
                    },
                ],
            })
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        writes: Mutex<Vec<(String, String)>>,
    }

    impl ObjectStore for MemoryStore {
        fn write_object(
            &self,
            bucket: &str,
            key: &str,
            _: &[u8],
            _: &str,
            _: &BTreeMap<String, String>,
        ) -> Result<(), String> {
            self.writes
                .lock()
                .map_err(|_| "writes lock poisoned".to_string())?
                .push((bucket.to_string(), key.to_string()));
            Ok(())
        }

        fn presigned_get_url(&self, bucket: &str, key: &str, _: Duration) -> Result<String, String> {
            Ok(format!("https://{bucket}.s3.amazonaws.com/{key}?X-Amz-Signature=abc"))
        }
    }

    struct DownNotifier;

    impl Notifier for DownNotifier {
        fn publish(&self, _: &str, _: &str, _: &str) -> Result<Option<String>, String> {
            Err("AuthorizationError".to_string())
        }
    }

    fn asset_added() -> Value {
        json!({
            "detail-type": "Asset Added To Catalog",
            "account": "111122223333",
            "region": "us-west-2",
            "detail": {
                "metadata": {"domain": "dzd_1", "owningProjectId": "prj-1"},
                "data": {"assetId": "asset-1"}
            }
        })
    }

    #[test]
    fn publish_failure_is_reported_as_server_error() {
        let store = MemoryStore::default();

        let response = handle_catalog_event(
            &asset_added(),
            &AssetMetadataSettings::default(),
            &FixedCatalog,
            &store,
            &DownNotifier,
        )
        .expect("handler should reply");

        assert_eq!(response.status_code, 500);
        assert_eq!(
            response.body,
            "\"Error publishing message: AuthorizationError\""
        );
        assert_eq!(
            *store.writes.lock().expect("writes lock"),
            vec![(
                "pnp-datazone-metadata-bucket-111122223333-us-west-2".to_string(),
                "datazone-assets/corp/finance/ledger/orders.csv".to_string(),
            )]
        );
    }

    #[test]
    fn missing_account_without_override_fails() {
        let mut event = asset_added();
        event.as_object_mut().expect("object").remove("account");

        let error = handle_catalog_event(
            &event,
            &AssetMetadataSettings::default(),
            &FixedCatalog,
            &MemoryStore::default(),
            &DownNotifier,
        )
        .expect_err("bucket cannot be derived");

        assert!(matches!(error, MetadataError::MissingField("account")));
    }
}
