//! Output-format planning.
//!
//! Decides the target container, content type, and filename before any
//! decode work, from the declared content type alone.

use std::path::Path;

/// Containers the pipeline can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl OutputKind {
    pub fn content_type(self) -> &'static str {
        match self {
            OutputKind::Jpeg => "image/jpeg",
            OutputKind::Png => "image/png",
            OutputKind::Gif => "image/gif",
            OutputKind::WebP => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputKind::Jpeg => "jpg",
            OutputKind::Png => "png",
            OutputKind::Gif => "gif",
            OutputKind::WebP => "webp",
        }
    }
}

/// Content types that keep their container. Everything else converts to
/// JPEG. A table, so adding a passthrough type is a one-line change.
const PASSTHROUGH: &[(&str, OutputKind)] = &[
    ("image/jpeg", OutputKind::Jpeg),
    ("image/jpg", OutputKind::Jpeg),
    ("image/png", OutputKind::Png),
    ("image/gif", OutputKind::Gif),
    ("image/webp", OutputKind::WebP),
];

/// The target a single processing attempt encodes toward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingPlan {
    pub format: OutputKind,
    pub content_type: String,
    pub filename: String,
    /// True when the source container differs from the target.
    pub convert: bool,
}

impl ProcessingPlan {
    /// The plan the fallback tier uses: JPEG regardless of the original
    /// container, filename rewritten to match.
    pub fn fallback(&self) -> ProcessingPlan {
        ProcessingPlan {
            format: OutputKind::Jpeg,
            content_type: OutputKind::Jpeg.content_type().to_string(),
            filename: rewrite_extension(&self.filename, OutputKind::Jpeg.extension()),
            convert: true,
        }
    }
}

pub struct FormatPlanner;

impl FormatPlanner {
    pub fn plan(filename: &str, content_type: &str) -> ProcessingPlan {
        let normalized = content_type.to_lowercase();

        if let Some((_, kind)) = PASSTHROUGH.iter().find(|(ct, _)| *ct == normalized) {
            return ProcessingPlan {
                format: *kind,
                content_type: kind.content_type().to_string(),
                filename: filename.to_string(),
                convert: false,
            };
        }

        // HEIC/HEIF and anything unrecognized convert to JPEG.
        ProcessingPlan {
            format: OutputKind::Jpeg,
            content_type: OutputKind::Jpeg.content_type().to_string(),
            filename: rewrite_extension(filename, OutputKind::Jpeg.extension()),
            convert: true,
        }
    }
}

fn rewrite_extension(filename: &str, extension: &str) -> String {
    Path::new(filename)
        .with_extension(extension)
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_containers_pass_through() {
        for (content_type, kind) in [
            ("image/jpeg", OutputKind::Jpeg),
            ("image/png", OutputKind::Png),
            ("image/gif", OutputKind::Gif),
            ("image/webp", OutputKind::WebP),
        ] {
            let plan = FormatPlanner::plan("photo.bin", content_type);
            assert_eq!(plan.format, kind);
            assert!(!plan.convert);
            assert_eq!(plan.filename, "photo.bin");
        }
    }

    #[test]
    fn jpg_alias_normalizes_to_jpeg() {
        let plan = FormatPlanner::plan("a.jpg", "image/jpg");
        assert_eq!(plan.format, OutputKind::Jpeg);
        assert_eq!(plan.content_type, "image/jpeg");
        assert!(!plan.convert);
    }

    #[test]
    fn heic_converts_to_jpeg() {
        let plan = FormatPlanner::plan("IMG_0042.HEIC", "image/heic");
        assert_eq!(plan.format, OutputKind::Jpeg);
        assert_eq!(plan.content_type, "image/jpeg");
        assert_eq!(plan.filename, "IMG_0042.jpg");
        assert!(plan.convert);
    }

    #[test]
    fn heif_converts_to_jpeg() {
        let plan = FormatPlanner::plan("shot.heif", "image/heif");
        assert_eq!(plan.content_type, "image/jpeg");
        assert!(plan.convert);
    }

    #[test]
    fn unknown_type_converts_to_jpeg() {
        let plan = FormatPlanner::plan("scan.tiff", "image/tiff");
        assert_eq!(plan.format, OutputKind::Jpeg);
        assert_eq!(plan.filename, "scan.jpg");
        assert!(plan.convert);
    }

    #[test]
    fn content_type_match_is_case_insensitive() {
        let plan = FormatPlanner::plan("a.png", "IMAGE/PNG");
        assert_eq!(plan.format, OutputKind::Png);
        assert!(!plan.convert);
    }

    #[test]
    fn fallback_plan_forces_jpeg() {
        let plan = FormatPlanner::plan("big.png", "image/png");
        let fallback = plan.fallback();
        assert_eq!(fallback.format, OutputKind::Jpeg);
        assert_eq!(fallback.content_type, "image/jpeg");
        assert_eq!(fallback.filename, "big.jpg");
        assert!(fallback.convert);
    }

    #[test]
    fn filename_without_extension_gains_one() {
        let plan = FormatPlanner::plan("bare", "image/heic");
        assert_eq!(plan.filename, "bare.jpg");
    }
}
