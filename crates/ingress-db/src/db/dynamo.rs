//! DynamoDB record store.
//!
//! Item layout:
//!
//! | attribute             | type | value                                        |
//! |-----------------------|------|----------------------------------------------|
//! | `id`                  | S    | crop-resistant hash (partition key)          |
//! | `classification`      | S    |                                              |
//! | `link`                | S    | request url                                  |
//! | `hashes`              | M    | `crop_res_hash`, `color_hash`, `p_hash`      |
//! | `dataset_origin`      | S    |                                              |
//! | `dataset_origin_json` | M    | every request attribute, values as strings   |
//! | `filename`            | S    | derivative filename incl. `.jpeg`            |
//! | `group`               | S    |                                              |
//! | `data_source`         | S    |                                              |

use super::{InsertOutcome, RecordStore, RecordStoreError, RecordStoreResult};
use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use ingress_core::models::{FingerprintSet, ImageRecord};
use std::collections::{BTreeMap, HashMap};

type Item = HashMap<String, AttributeValue>;

#[derive(Clone)]
pub struct DynamoRecordStore {
    client: Client,
    table_name: String,
}

impl DynamoRecordStore {
    pub fn new(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }

    /// Build a client from the default AWS credential chain.
    pub async fn connect(region: &str, table_name: String) -> Self {
        let config = ingress_infra::load_sdk_config(region).await;
        Self::new(Client::new(&config), table_name)
    }

    async fn get_item(
        &self,
        id: &str,
        projection: Option<&str>,
    ) -> RecordStoreResult<Option<Item>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .consistent_read(true)
            .set_projection_expression(projection.map(String::from))
            .send()
            .await
            .map_err(|e| RecordStoreError::Backend(DisplayErrorContext(&e).to_string()))?;

        Ok(output.item)
    }
}

fn string_map(map: &BTreeMap<String, String>) -> AttributeValue {
    AttributeValue::M(
        map.iter()
            .map(|(k, v)| (k.clone(), AttributeValue::S(v.clone())))
            .collect(),
    )
}

pub(crate) fn to_item(record: &ImageRecord) -> Item {
    HashMap::from([
        ("id".to_string(), AttributeValue::S(record.id.clone())),
        (
            "classification".to_string(),
            AttributeValue::S(record.classification.clone()),
        ),
        ("link".to_string(), AttributeValue::S(record.link.clone())),
        ("hashes".to_string(), string_map(&record.hashes.to_attributes())),
        (
            "dataset_origin".to_string(),
            AttributeValue::S(record.dataset_origin.clone()),
        ),
        (
            "dataset_origin_json".to_string(),
            string_map(&record.dataset_origin_json),
        ),
        ("filename".to_string(), AttributeValue::S(record.filename.clone())),
        ("group".to_string(), AttributeValue::S(record.group.clone())),
        (
            "data_source".to_string(),
            AttributeValue::S(record.data_source.clone()),
        ),
    ])
}

fn get_s(item: &Item, name: &str) -> RecordStoreResult<String> {
    item.get(name)
        .and_then(|value| value.as_s().ok())
        .cloned()
        .ok_or_else(|| {
            RecordStoreError::InvalidRecord(format!("missing string attribute {}", name))
        })
}

fn get_string_map(item: &Item, name: &str) -> RecordStoreResult<BTreeMap<String, String>> {
    let map = item
        .get(name)
        .and_then(|value| value.as_m().ok())
        .ok_or_else(|| RecordStoreError::InvalidRecord(format!("missing map attribute {}", name)))?;

    map.iter()
        .map(|(k, v)| {
            v.as_s().map(|s| (k.clone(), s.clone())).map_err(|_| {
                RecordStoreError::InvalidRecord(format!("{}.{} is not a string", name, k))
            })
        })
        .collect()
}

pub(crate) fn from_item(item: &Item) -> RecordStoreResult<ImageRecord> {
    let hashes = FingerprintSet::from_attributes(&get_string_map(item, "hashes")?)
        .ok_or_else(|| RecordStoreError::InvalidRecord("incomplete hashes map".to_string()))?;

    Ok(ImageRecord {
        id: get_s(item, "id")?,
        classification: get_s(item, "classification")?,
        link: get_s(item, "link")?,
        hashes,
        dataset_origin: get_s(item, "dataset_origin")?,
        dataset_origin_json: get_string_map(item, "dataset_origin_json")?,
        filename: get_s(item, "filename")?,
        group: get_s(item, "group")?,
        data_source: get_s(item, "data_source")?,
    })
}

#[async_trait]
impl RecordStore for DynamoRecordStore {
    #[tracing::instrument(skip(self), fields(db.system = "dynamodb", db.table = %self.table_name))]
    async fn exists(&self, id: &str) -> RecordStoreResult<bool> {
        Ok(self.get_item(id, Some("id")).await?.is_some())
    }

    #[tracing::instrument(
        skip(self, record),
        fields(db.system = "dynamodb", db.table = %self.table_name, db.record_id = %record.id)
    )]
    async fn insert_if_absent(&self, record: &ImageRecord) -> RecordStoreResult<InsertOutcome> {
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(to_item(record)))
            .condition_expression("attribute_not_exists(id)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(e)
                if e.as_service_error()
                    .map(|se| se.is_conditional_check_failed_exception())
                    .unwrap_or(false) =>
            {
                Ok(InsertOutcome::AlreadyExists)
            }
            Err(e) => Err(RecordStoreError::Backend(DisplayErrorContext(&e).to_string())),
        }
    }

    #[tracing::instrument(skip(self), fields(db.system = "dynamodb", db.table = %self.table_name))]
    async fn get(&self, id: &str) -> RecordStoreResult<Option<ImageRecord>> {
        self.get_item(id, None)
            .await?
            .map(|item| from_item(&item))
            .transpose()
    }

    fn backend_name(&self) -> &'static str {
        "dynamodb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingress_core::models::IngestionRequest;

    fn record() -> ImageRecord {
        let request = IngestionRequest::from_body(
            r#"{"url": "cats/001", "classification": "cat", "data_source": "s3_bucket",
                "bucket_name": "public-images", "origin": "survey", "tags": ["a", "b"]}"#,
        )
        .unwrap();
        let hashes = FingerprintSet {
            crop_resistant_hash: "a1b2c3d4e5f6a7b8,0f0f0f0f0f0f0f0f".to_string(),
            perceptual_hash: "d1d1d1d1d1d1d1d1".to_string(),
            color_hash: "00400000000".to_string(),
        };
        ImageRecord::new(&request, hashes, "f00d_cat.jpeg".to_string())
    }

    #[test]
    fn item_uses_stored_attribute_names() {
        let item = to_item(&record());

        assert_eq!(
            item["id"].as_s().unwrap(),
            "a1b2c3d4e5f6a7b8,0f0f0f0f0f0f0f0f"
        );
        assert_eq!(item["data_source"].as_s().unwrap(), "s3_bucket");
        assert_eq!(item["filename"].as_s().unwrap(), "f00d_cat.jpeg");

        let hashes = item["hashes"].as_m().unwrap();
        assert_eq!(hashes["p_hash"].as_s().unwrap(), "d1d1d1d1d1d1d1d1");
        assert_eq!(hashes["color_hash"].as_s().unwrap(), "00400000000");
        assert!(hashes.contains_key("crop_res_hash"));

        let origin = item["dataset_origin_json"].as_m().unwrap();
        assert_eq!(origin["bucket_name"].as_s().unwrap(), "public-images");
        assert_eq!(origin["tags"].as_s().unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn item_converts_back_to_record() {
        let original = record();
        let restored = from_item(&to_item(&original)).unwrap();
        assert_eq!(restored, original);
    }

    #[tokio::test]
    async fn connect_uses_configured_region() {
        let store = DynamoRecordStore::connect("eu-west-1", "images".to_string()).await;

        let region = store.client.config().region().map(|r| r.as_ref().to_string());
        assert_eq!(region.as_deref(), Some("eu-west-1"));
        assert_eq!(store.table_name, "images");
    }

    #[test]
    fn item_without_hashes_is_invalid() {
        let mut item = to_item(&record());
        item.remove("hashes");
        assert!(matches!(
            from_item(&item),
            Err(RecordStoreError::InvalidRecord(_))
        ));
    }
}
