use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::attributes::flatten_attributes;
use crate::models::fingerprint::FingerprintSet;
use crate::models::request::IngestionRequest;

/// Persisted entity, keyed by the crop-resistant hash. Written at most once and
/// never updated by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    pub classification: String,
    pub link: String,
    pub hashes: FingerprintSet,
    pub dataset_origin: String,
    pub dataset_origin_json: BTreeMap<String, String>,
    pub filename: String,
    pub group: String,
    pub data_source: String,
}

impl ImageRecord {
    /// Build the record for a newly seen image. `filename` is the stored
    /// derivative name including its extension.
    pub fn new(request: &IngestionRequest, hashes: FingerprintSet, filename: String) -> Self {
        let dataset_origin_json = serde_json::to_value(request)
            .map(|value| flatten_attributes(&value))
            .unwrap_or_default();

        Self {
            id: hashes.crop_resistant_hash.clone(),
            classification: request.classification.clone(),
            link: request.url.clone(),
            hashes,
            dataset_origin: request.origin_label().to_string(),
            dataset_origin_json,
            filename,
            group: request.group_label().to_string(),
            data_source: request.data_source.as_str().to_string(),
        }
    }
}
