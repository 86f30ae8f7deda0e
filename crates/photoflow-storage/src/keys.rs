//! Key generation and metadata encoding shared by all backends.

use std::collections::BTreeMap;
use std::path::Path;

use photoflow_core::models::BlobMetadata;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Generate a blob key, keeping the upload's extension so the stored object
/// remains recognizable: `assets/{uuid}.{ext}`.
pub(crate) fn generate_key(filename: &str) -> String {
    match Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
    {
        Some(ext) => format!("assets/{}.{}", Uuid::new_v4(), ext),
        None => format!("assets/{}", Uuid::new_v4()),
    }
}

/// Hex-encoded SHA-256 of the blob content.
pub(crate) fn checksum_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Flatten blob identity and metadata into a string map. Filename and
/// checksum ride along so `head` can rebuild a full [`StoredBlob`] from the
/// backend's metadata alone.
pub(crate) fn encode_metadata(
    filename: &str,
    checksum: &str,
    metadata: &BlobMetadata,
) -> BTreeMap<String, String> {
    let mut map = metadata.to_string_map();
    map.insert("filename".to_string(), filename.to_string());
    map.insert("checksum".to_string(), checksum.to_string());
    map
}

/// Inverse of [`encode_metadata`].
pub(crate) fn decode_metadata(map: &BTreeMap<String, String>) -> (String, String, BlobMetadata) {
    let mut metadata = BlobMetadata::from_string_map(map);
    let filename = metadata.extra.remove("filename").unwrap_or_default();
    let checksum = metadata.extra.remove("checksum").unwrap_or_default();
    (filename, checksum, metadata)
}
