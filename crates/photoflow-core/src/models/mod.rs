pub mod asset;
pub mod blob;

pub use asset::{AssetRecord, ExtractedMetadata, GeoPoint, UploadedAsset};
pub use blob::{BlobMetadata, StoredBlob};
