//! Catalog event parsing and metadata CSV rendering for the asset download
//! pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MetadataError;

pub const ASSET_ADDED_TO_CATALOG: &str = "Asset Added To Catalog";
pub const METADATA_GENERATION_ACCEPTED: &str = "Metadata Generation Accepted";
pub const COMMON_DETAILS_FORM: &str = "AssetCommonDetailsForm";
pub const COLUMN_METADATA_FORM: &str = "ColumnBusinessMetadataForm";
pub const OBJECT_KEY_PREFIX: &str = "datazone-assets";
pub const NOTIFICATION_SUBJECT: &str = "datazone Asset Metadata Download Notification";

/// Fields pulled out of an EventBridge catalog event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEvent {
    pub detail_type: String,
    pub user_id: Option<String>,
    pub asset_id: String,
    pub domain_id: String,
    pub project_id: String,
    pub create_date: Option<DateTime<Utc>>,
    pub account: Option<String>,
    pub region: Option<String>,
}

impl CatalogEvent {
    pub fn from_event(event: &Value) -> Result<Self, MetadataError> {
        let detail_type = string_at(event, &["detail-type"])
            .ok_or(MetadataError::MissingField("detail-type"))?;

        let (user_id, asset_id) = match detail_type.as_str() {
            ASSET_ADDED_TO_CATALOG => (
                string_at(event, &["detail", "metadata", "user"]),
                string_at(event, &["detail", "data", "assetId"])
                    .ok_or(MetadataError::MissingField("detail.data.assetId"))?,
            ),
            METADATA_GENERATION_ACCEPTED => (
                string_at(event, &["detail", "data", "userId"]),
                string_at(event, &["detail", "metadata", "id"])
                    .ok_or(MetadataError::MissingField("detail.metadata.id"))?,
            ),
            _ => return Err(MetadataError::UnsupportedEvent(detail_type)),
        };

        Ok(Self {
            user_id,
            asset_id,
            domain_id: string_at(event, &["detail", "metadata", "domain"])
                .ok_or(MetadataError::MissingField("detail.metadata.domain"))?,
            project_id: string_at(event, &["detail", "metadata", "owningProjectId"])
                .ok_or(MetadataError::MissingField("detail.metadata.owningProjectId"))?,
            create_date: string_at(event, &["time"])
                .and_then(|time| DateTime::parse_from_rfc3339(&time).ok())
                .map(|time| time.with_timezone(&Utc)),
            account: string_at(event, &["account"]),
            region: string_at(event, &["region"]),
            detail_type,
        })
    }
}

fn string_at(event: &Value, path: &[&str]) -> Option<String> {
    path.iter()
        .try_fold(event, |value, key| value.get(key))
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// One form attached to a catalog asset, as returned by GetAsset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetForm {
    pub form_name: String,
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    pub name: String,
    pub revision: String,
    pub forms: Vec<AssetForm>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMetadata {
    pub column_identifier: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommonDetailsContent {
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColumnMetadataContent {
    #[serde(default)]
    columns_business_metadata: Vec<ColumnMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMetadata {
    pub name: String,
    pub revision: String,
    pub summary: Option<String>,
    pub columns: Vec<ColumnMetadata>,
}

impl AssetMetadata {
    pub fn from_record(record: AssetRecord) -> Result<Self, MetadataError> {
        let common: CommonDetailsContent = parse_form(&record.forms, COMMON_DETAILS_FORM)?;
        let columns: ColumnMetadataContent = parse_form(&record.forms, COLUMN_METADATA_FORM)?;

        Ok(Self {
            name: record.name,
            revision: record.revision,
            summary: common.summary,
            columns: columns.columns_business_metadata,
        })
    }

    pub fn to_csv(&self) -> Result<Vec<u8>, MetadataError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["column_name", "description"])
            .map_err(|error| MetadataError::Csv(error.to_string()))?;
        for column in &self.columns {
            writer
                .write_record([
                    column.column_identifier.as_str(),
                    column.description.as_deref().unwrap_or(""),
                ])
                .map_err(|error| MetadataError::Csv(error.to_string()))?;
        }
        writer
            .into_inner()
            .map_err(|error| MetadataError::Csv(error.to_string()))
    }
}

fn parse_form<T: for<'de> Deserialize<'de>>(
    forms: &[AssetForm],
    form_name: &'static str,
) -> Result<T, MetadataError> {
    let content = forms
        .iter()
        .find(|form| form.form_name == form_name)
        .and_then(|form| form.content.as_deref())
        .ok_or(MetadataError::MissingForm(form_name))?;

    serde_json::from_str(content).map_err(|source| MetadataError::MalformedForm {
        form: form_name,
        source,
    })
}

/// Human-readable location of a catalog asset inside the metadata bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLocation {
    pub domain_name: String,
    pub domain_unit_name: String,
    pub project_name: String,
    pub asset_name: String,
}

pub fn metadata_object_key(location: &AssetLocation) -> String {
    format!(
        "{OBJECT_KEY_PREFIX}/{}/{}/{}/{}.csv",
        location.domain_name, location.domain_unit_name, location.project_name, location.asset_name,
    )
}

/// User metadata stored with the CSV object so a download can be traced back
/// to the catalog event that produced it.
pub fn object_metadata(
    event: &CatalogEvent,
    metadata: &AssetMetadata,
) -> BTreeMap<String, String> {
    let mut entries = BTreeMap::from([
        ("asset-id".to_string(), event.asset_id.clone()),
        ("asset-revision".to_string(), metadata.revision.clone()),
    ]);
    if let Some(create_date) = event.create_date {
        entries.insert(
            "catalog-event-time".to_string(),
            create_date.to_rfc3339_opts(SecondsFormat::Secs, true),
        );
    }
    if let Some(user_id) = &event.user_id {
        entries.insert("requested-by".to_string(), user_id.clone());
    }
    entries
}

pub fn default_metadata_bucket(account: &str, region: &str) -> String {
    format!("pnp-datazone-metadata-bucket-{account}-{region}")
}

pub fn default_notification_topic(account: &str, region: &str) -> String {
    format!("arn:aws:sns:{region}:{account}:pnp-slack-subscription")
}
