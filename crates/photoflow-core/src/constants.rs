//! Processing budgets and content-type tables.

/// Largest upload accepted for processing.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Largest encoded output accepted from either compression tier.
pub const MAX_PROCESSED_BYTES: usize = 3 * 1024 * 1024;

/// Longest edge after the first compression tier.
pub const MAX_DIMENSION: u32 = 1000;

/// Longest edge after the fallback compression tier.
pub const FALLBACK_DIMENSION: u32 = 500;

/// JPEG quality used when converting from a non-web container.
pub const CONVERT_QUALITY: u8 = 85;

/// JPEG quality forced by the fallback tier.
pub const FALLBACK_QUALITY: u8 = 70;

/// Content types accepted at ingest. GIF is rejected separately so callers
/// can surface a distinct message for animated uploads.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/heic",
    "image/heif",
    "image/webp",
];
