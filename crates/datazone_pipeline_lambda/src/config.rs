//! Environment configuration, read once at cold start.

use std::time::Duration;

use thiserror::Error;

pub const READINESS_DELAY_SECONDS: &str = "READINESS_DELAY_SECONDS";
pub const FAIL_ON_EXHAUSTED_DELETE: &str = "FAIL_ON_EXHAUSTED_DELETE";
pub const METADATA_BUCKET: &str = "METADATA_BUCKET";
pub const NOTIFICATION_TOPIC_ARN: &str = "NOTIFICATION_TOPIC_ARN";
pub const PRESIGNED_URL_TTL_SECONDS: &str = "PRESIGNED_URL_TTL_SECONDS";

pub const DEFAULT_READINESS_DELAY: Duration = Duration::from_secs(10);
pub const DEFAULT_PRESIGNED_URL_TTL: Duration = Duration::from_secs(86_400);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name} must be {expected}, got '{value}'")]
pub struct ConfigError {
    pub name: &'static str,
    pub expected: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyGrantSettings {
    /// Slept before validation so freshly created catalog resources settle.
    pub readiness_delay: Duration,
    /// Report FAILED when RemovePolicyGrant exhausts its retries.
    pub fail_on_exhausted_delete: bool,
}

impl Default for PolicyGrantSettings {
    fn default() -> Self {
        Self {
            readiness_delay: DEFAULT_READINESS_DELAY,
            fail_on_exhausted_delete: false,
        }
    }
}

impl PolicyGrantSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            readiness_delay: seconds(&lookup, READINESS_DELAY_SECONDS)?
                .unwrap_or(defaults.readiness_delay),
            fail_on_exhausted_delete: flag(&lookup, FAIL_ON_EXHAUSTED_DELETE)?
                .unwrap_or(defaults.fail_on_exhausted_delete),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMetadataSettings {
    pub bucket: Option<String>,
    pub topic_arn: Option<String>,
    pub presigned_url_ttl: Duration,
}

impl Default for AssetMetadataSettings {
    fn default() -> Self {
        Self {
            bucket: None,
            topic_arn: None,
            presigned_url_ttl: DEFAULT_PRESIGNED_URL_TTL,
        }
    }
}

impl AssetMetadataSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            bucket: non_empty(&lookup, METADATA_BUCKET),
            topic_arn: non_empty(&lookup, NOTIFICATION_TOPIC_ARN),
            presigned_url_ttl: seconds(&lookup, PRESIGNED_URL_TTL_SECONDS)?
                .unwrap_or(DEFAULT_PRESIGNED_URL_TTL),
        })
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    non_empty(lookup, name)
        .map(|value| {
            value
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError {
                    name,
                    expected: "a whole number of seconds",
                    value,
                })
        })
        .transpose()
}

fn flag(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<bool>, ConfigError> {
    non_empty(lookup, name)
        .map(|value| match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError {
                name,
                expected: "true or false",
                value,
            }),
        })
        .transpose()
}
