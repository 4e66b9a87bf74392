use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use datazone_pipeline_core::asset_metadata::{AssetForm, AssetRecord, NOTIFICATION_SUBJECT};
use datazone_pipeline_core::error::MetadataError;
use datazone_pipeline_lambda::adapters::catalog::{CatalogReader, ProjectSummary};
use datazone_pipeline_lambda::adapters::notifier::Notifier;
use datazone_pipeline_lambda::adapters::object_store::ObjectStore;
use datazone_pipeline_lambda::config::AssetMetadataSettings;
use datazone_pipeline_lambda::handlers::asset_metadata::handle_catalog_event;
use serde_json::{json, Value};

#[derive(Default)]
struct RecordingCatalog {
    lookups: Mutex<Vec<String>>,
    asset_unavailable: bool,
}

impl RecordingCatalog {
    fn lookups(&self) -> Vec<String> {
        self.lookups.lock().expect("lookups lock").clone()
    }

    fn record(&self, lookup: String) {
        self.lookups.lock().expect("lookups lock").push(lookup);
    }
}

impl CatalogReader for RecordingCatalog {
    fn get_project(&self, domain_id: &str, project_id: &str) -> Result<ProjectSummary, String> {
        self.record(format!("project {domain_id}/{project_id}"));
        Ok(ProjectSummary {
            name: "sales-analytics".to_string(),
            domain_unit_id: Some("du-7".to_string()),
        })
    }

    fn get_domain_unit_name(&self, domain_id: &str, domain_unit_id: &str) -> Result<String, String> {
        self.record(format!("domain_unit {domain_id}/{domain_unit_id}"));
        Ok("emea".to_string())
    }

    fn get_domain_name(&self, domain_id: &str) -> Result<String, String> {
        self.record(format!("domain {domain_id}"));
        Ok("retail".to_string())
    }

    fn get_asset(&self, domain_id: &str, asset_id: &str) -> Result<AssetRecord, String> {
        self.record(format!("asset {domain_id}/{asset_id}"));
        if self.asset_unavailable {
            return Err("GetAsset failed: ResourceNotFoundException".to_string());
        }
        Ok(AssetRecord {
            name: "weekly_orders".to_string(),
            revision: "4".to_string(),
            forms: vec![
                AssetForm {
                    form_name: "AssetCommonDetailsForm".to_string(),
                    content: Some(r#"{"summary":"Orders rolled up per week"}"#.to_string()),
                },
                AssetForm {
                    form_name: "ColumnBusinessMetadataForm".to_string(),
                    content: Some(
                        r#"{"columnsBusinessMetadata":[
                            {"columnIdentifier":"week","description":"ISO week"},
                            {"columnIdentifier":"total","description":"Gross, in EUR"}
                        ]}"#
                        .to_string(),
                    ),
                },
            ],
        })
    }
}

struct StoredObject {
    bucket: String,
    key: String,
    body: String,
    content_type: String,
    metadata: BTreeMap<String, String>,
}

#[derive(Default)]
struct RecordingStore {
    objects: Mutex<Vec<StoredObject>>,
    presign_windows: Mutex<Vec<Duration>>,
}

impl ObjectStore for RecordingStore {
    fn write_object(
        &self,
        bucket: &str,
        key: &str,
        body: &[u8],
        content_type: &str,
        metadata: &BTreeMap<String, String>,
    ) -> Result<(), String> {
        self.objects.lock().expect("objects lock").push(StoredObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            body: String::from_utf8_lossy(body).into_owned(),
            content_type: content_type.to_string(),
            metadata: metadata.clone(),
        });
        Ok(())
    }

    fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, String> {
        self.presign_windows
            .lock()
            .expect("presign lock")
            .push(expires_in);
        Ok(format!(
            "https://{bucket}.s3.eu-west-1.amazonaws.com/{key}?X-Amz-Expires={}",
            expires_in.as_secs()
        ))
    }
}

#[derive(Default)]
struct RecordingNotifier {
    published: Mutex<Vec<(String, String, String)>>,
}

impl Notifier for RecordingNotifier {
    fn publish(
        &self,
        topic_arn: &str,
        subject: &str,
        message: &str,
    ) -> Result<Option<String>, String> {
        self.published.lock().expect("published lock").push((
            topic_arn.to_string(),
            subject.to_string(),
            message.to_string(),
        ));
        Ok(Some("msg-1".to_string()))
    }
}

fn metadata_generation_accepted() -> Value {
    json!({
        "version": "0",
        "detail-type": "Metadata Generation Accepted",
        "source": "aws.datazone",
        "account": "444455556666",
        "time": "2026-10-18T07:30:00Z",
        "region": "eu-west-1",
        "detail": {
            "version": "1",
            "metadata": {
                "id": "asset-42",
                "domain": "dzd_retail",
                "owningProjectId": "prj-sales"
            },
            "data": {"userId": "user-9"}
        }
    })
}

#[test]
fn writes_csv_and_publishes_download_link() {
    let catalog = RecordingCatalog::default();
    let store = RecordingStore::default();
    let notifier = RecordingNotifier::default();

    let response = handle_catalog_event(
        &metadata_generation_accepted(),
        &AssetMetadataSettings::default(),
        &catalog,
        &store,
        &notifier,
    )
    .expect("handler should succeed");

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "\"Message published successfully!\"");
    assert_eq!(
        catalog.lookups(),
        vec![
            "project dzd_retail/prj-sales",
            "domain_unit dzd_retail/du-7",
            "domain dzd_retail",
            "asset dzd_retail/asset-42",
        ]
    );

    let objects = store.objects.lock().expect("objects lock");
    assert_eq!(objects.len(), 1);
    assert_eq!(
        objects[0].bucket,
        "pnp-datazone-metadata-bucket-444455556666-eu-west-1"
    );
    assert_eq!(
        objects[0].key,
        "datazone-assets/retail/emea/sales-analytics/weekly_orders.csv"
    );
    assert_eq!(objects[0].content_type, "text/csv");
    assert_eq!(
        objects[0].metadata,
        BTreeMap::from([
            ("asset-id".to_string(), "asset-42".to_string()),
            ("asset-revision".to_string(), "4".to_string()),
            (
                "catalog-event-time".to_string(),
                "2026-10-18T07:30:00Z".to_string()
            ),
            ("requested-by".to_string(), "user-9".to_string()),
        ])
    );
    assert_eq!(
        objects[0].body,
        "column_name,description\nweek,ISO week\ntotal,\"Gross, in EUR\"\n"
    );
    assert_eq!(
        *store.presign_windows.lock().expect("presign lock"),
        vec![Duration::from_secs(86_400)]
    );

    let published = notifier.published.lock().expect("published lock");
    assert_eq!(published.len(), 1);
    let (topic_arn, subject, message) = &published[0];
    assert_eq!(topic_arn, "arn:aws:sns:eu-west-1:444455556666:pnp-slack-subscription");
    assert_eq!(subject, NOTIFICATION_SUBJECT);
    assert!(message.ends_with("weekly_orders.csv?X-Amz-Expires=86400"));
}

#[test]
fn configured_targets_override_naming_convention() {
    let store = RecordingStore::default();
    let notifier = RecordingNotifier::default();
    let settings = AssetMetadataSettings {
        bucket: Some("catalog-exports".to_string()),
        topic_arn: Some("arn:aws:sns:eu-west-1:444455556666:catalog".to_string()),
        presigned_url_ttl: Duration::from_secs(900),
    };

    handle_catalog_event(
        &metadata_generation_accepted(),
        &settings,
        &RecordingCatalog::default(),
        &store,
        &notifier,
    )
    .expect("handler should succeed");

    assert_eq!(
        store.objects.lock().expect("objects lock")[0].bucket,
        "catalog-exports"
    );
    assert_eq!(
        *store.presign_windows.lock().expect("presign lock"),
        vec![Duration::from_secs(900)]
    );
    assert_eq!(
        notifier.published.lock().expect("published lock")[0].0,
        "arn:aws:sns:eu-west-1:444455556666:catalog"
    );
}

#[test]
fn unrelated_detail_type_is_rejected_without_lookups() {
    let catalog = RecordingCatalog::default();
    let store = RecordingStore::default();
    let notifier = RecordingNotifier::default();
    let mut event = metadata_generation_accepted();
    event["detail-type"] = json!("Subscription Request Accepted");

    let response = handle_catalog_event(
        &event,
        &AssetMetadataSettings::default(),
        &catalog,
        &store,
        &notifier,
    )
    .expect("client errors become a response");

    assert_eq!(response.status_code, 400);
    assert!(catalog.lookups().is_empty());
    assert!(store.objects.lock().expect("objects lock").is_empty());
    assert!(notifier.published.lock().expect("published lock").is_empty());
}

#[test]
fn catalog_failure_propagates_and_stores_nothing() {
    let catalog = RecordingCatalog {
        asset_unavailable: true,
        ..RecordingCatalog::default()
    };
    let store = RecordingStore::default();
    let notifier = RecordingNotifier::default();

    let error = handle_catalog_event(
        &metadata_generation_accepted(),
        &AssetMetadataSettings::default(),
        &catalog,
        &store,
        &notifier,
    )
    .expect_err("lookup failure should propagate");

    assert!(matches!(error, MetadataError::Catalog(_)));
    assert!(store.objects.lock().expect("objects lock").is_empty());
    assert!(notifier.published.lock().expect("published lock").is_empty());
}
