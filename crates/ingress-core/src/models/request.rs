//! Inbound queue message.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::{IngestError, IngestResult};

/// Where the bytes of the referenced image come from.
///
/// Any label other than `s3_bucket` or `body_image` is treated as a remote link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataSource {
    #[default]
    Url,
    S3Bucket,
    BodyImage,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Url => "url",
            DataSource::S3Bucket => "s3_bucket",
            DataSource::BodyImage => "body_image",
        }
    }
}

impl From<String> for DataSource {
    fn from(value: String) -> Self {
        match value.as_str() {
            "s3_bucket" => DataSource::S3Bucket,
            "body_image" => DataSource::BodyImage,
            _ => DataSource::Url,
        }
    }
}

impl From<DataSource> for String {
    fn from(value: DataSource) -> Self {
        value.as_str().to_string()
    }
}

impl Display for DataSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// One inbound message.
///
/// `url` is a remote link, an object key (without the `.jpg` suffix) or a base64
/// payload depending on `data_source`. Fields not named here are kept in `extra`
/// so they end up in the stored provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionRequest {
    pub url: String,
    pub classification: String,
    #[serde(default)]
    pub data_source: DataSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IngestionRequest {
    /// Parse a queue message body.
    pub fn from_body(body: &str) -> IngestResult<Self> {
        let request: IngestionRequest = serde_json::from_str(body)?;
        request.validate()?;
        Ok(request)
    }

    /// Check the invariants that must hold before any fetch.
    pub fn validate(&self) -> IngestResult<()> {
        if self.url.trim().is_empty() {
            return Err(IngestError::rejected("url must not be empty"));
        }
        if self.classification.trim().is_empty() {
            return Err(IngestError::rejected("classification must not be empty"));
        }
        if self.data_source == DataSource::S3Bucket && self.bucket().is_none() {
            return Err(IngestError::rejected(
                "Data source is s3_bucket but no bucket_name given",
            ));
        }
        Ok(())
    }

    /// Non-empty bucket name, if any.
    pub fn bucket(&self) -> Option<&str> {
        self.bucket_name
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
    }

    pub fn origin_label(&self) -> &str {
        self.origin.as_deref().unwrap_or_default()
    }

    pub fn group_label(&self) -> &str {
        self.group.as_deref().unwrap_or_default()
    }
}
