use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute names used when the set is stored as a map.
pub const CROP_RESISTANT_KEY: &str = "crop_res_hash";
pub const PERCEPTUAL_KEY: &str = "p_hash";
pub const COLOR_KEY: &str = "color_hash";

/// The three fingerprints of a normalized image. `crop_resistant_hash` is the dedup key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintSet {
    pub crop_resistant_hash: String,
    pub perceptual_hash: String,
    pub color_hash: String,
}

impl FingerprintSet {
    pub fn to_attributes(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                CROP_RESISTANT_KEY.to_string(),
                self.crop_resistant_hash.clone(),
            ),
            (COLOR_KEY.to_string(), self.color_hash.clone()),
            (PERCEPTUAL_KEY.to_string(), self.perceptual_hash.clone()),
        ])
    }

    /// Rebuild from a stored map; `None` if any hash is missing.
    pub fn from_attributes(attributes: &BTreeMap<String, String>) -> Option<Self> {
        Some(Self {
            crop_resistant_hash: attributes.get(CROP_RESISTANT_KEY)?.clone(),
            perceptual_hash: attributes.get(PERCEPTUAL_KEY)?.clone(),
            color_hash: attributes.get(COLOR_KEY)?.clone(),
        })
    }
}
