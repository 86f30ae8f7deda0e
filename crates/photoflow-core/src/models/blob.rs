//! Stored blob models.
//!
//! Blob metadata travels with the object in every backend (S3 object
//! metadata, local sidecar file, memory map), so the flags survive a restart
//! and the idempotency check works against storage alone.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Flags and dimensions attached to a stored blob.
///
/// `processed` marks pipeline output; a blob carrying it is never fed through
/// the pipeline again. `identified` and `analyzed` short-circuit downstream
/// content inspection, which the pipeline has already performed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BlobMetadata {
    pub width: Option<u32>,
    pub height: Option<u32>,
    #[serde(default)]
    pub processed: bool,
    #[serde(default)]
    pub identified: bool,
    #[serde(default)]
    pub analyzed: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl BlobMetadata {
    /// Metadata stamped on pipeline output.
    pub fn processed(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            processed: true,
            identified: true,
            analyzed: true,
            extra: BTreeMap::new(),
        }
    }

    /// Flatten into a string map, the shape S3 object metadata expects.
    pub fn to_string_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        if let Some(width) = self.width {
            map.insert("width".to_string(), width.to_string());
        }
        if let Some(height) = self.height {
            map.insert("height".to_string(), height.to_string());
        }
        map.insert("processed".to_string(), self.processed.to_string());
        map.insert("identified".to_string(), self.identified.to_string());
        map.insert("analyzed".to_string(), self.analyzed.to_string());
        for (k, v) in &self.extra {
            map.insert(k.clone(), v.clone());
        }
        map
    }

    /// Rebuild from a string map. Unknown keys land in `extra`; malformed
    /// values fall back to the field default.
    pub fn from_string_map(map: &BTreeMap<String, String>) -> Self {
        let mut metadata = BlobMetadata::default();
        for (k, v) in map {
            match k.as_str() {
                "width" => metadata.width = v.parse().ok(),
                "height" => metadata.height = v.parse().ok(),
                "processed" => metadata.processed = v.parse().unwrap_or(false),
                "identified" => metadata.identified = v.parse().unwrap_or(false),
                "analyzed" => metadata.analyzed = v.parse().unwrap_or(false),
                _ => {
                    metadata.extra.insert(k.clone(), v.clone());
                }
            }
        }
        metadata
    }
}

/// A blob as known to the storage backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredBlob {
    pub key: String,
    pub filename: String,
    pub content_type: String,
    pub byte_size: u64,
    /// Hex-encoded SHA-256 of the blob content.
    pub checksum: String,
    pub metadata: BlobMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processed_metadata_sets_all_flags() {
        let metadata = BlobMetadata::processed(800, 600);
        assert_eq!(metadata.width, Some(800));
        assert_eq!(metadata.height, Some(600));
        assert!(metadata.processed);
        assert!(metadata.identified);
        assert!(metadata.analyzed);
    }

    #[test]
    fn string_map_round_trip() {
        let metadata = BlobMetadata::processed(1000, 750);
        let map = metadata.to_string_map();
        assert_eq!(map.get("processed").map(String::as_str), Some("true"));
        assert_eq!(BlobMetadata::from_string_map(&map), metadata);
    }

    #[test]
    fn unknown_keys_survive_in_extra() {
        let mut map = BTreeMap::new();
        map.insert("processed".to_string(), "true".to_string());
        map.insert("camera".to_string(), "X100V".to_string());

        let metadata = BlobMetadata::from_string_map(&map);
        assert!(metadata.processed);
        assert_eq!(metadata.extra.get("camera").map(String::as_str), Some("X100V"));

        let back = metadata.to_string_map();
        assert_eq!(back.get("camera").map(String::as_str), Some("X100V"));
    }

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        let mut map = BTreeMap::new();
        map.insert("width".to_string(), "not-a-number".to_string());
        map.insert("processed".to_string(), "yes".to_string());

        let metadata = BlobMetadata::from_string_map(&map);
        assert_eq!(metadata.width, None);
        assert!(!metadata.processed);
    }
}
