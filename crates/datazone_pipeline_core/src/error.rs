use thiserror::Error;

/// Rejected before any remote call is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInput {
    #[error("Invalid PrincipalType: {0}")]
    InvalidPrincipalType(String),
    #[error("Provided policy type doesn't exist: {0}")]
    UnknownPolicyType(String),
    #[error("Missing required resource property '{0}'")]
    MissingProperty(&'static str),
    #[error("Resource property '{name}' is invalid: {reason}")]
    InvalidProperty { name: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Unsupported catalog event detail-type: {0}")]
    UnsupportedEvent(String),
    #[error("Catalog event is missing '{0}'")]
    MissingField(&'static str),
    #[error("Asset is missing the {0} form")]
    MissingForm(&'static str),
    #[error("Form {form} has malformed content: {source}")]
    MalformedForm {
        form: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to render metadata csv: {0}")]
    Csv(String),
    #[error("Catalog lookup failed: {0}")]
    Catalog(String),
    #[error("Failed to store metadata object: {0}")]
    Storage(String),
}

impl MetadataError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnsupportedEvent(_) | Self::MissingField(_))
    }
}
