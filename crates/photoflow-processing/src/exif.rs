//! EXIF extraction: GPS coordinates and capture timestamp.
//!
//! Extraction is best-effort. Every failure is logged and degrades the field
//! to `None`; nothing here can fail the pipeline.

use std::io::Cursor;

use chrono::NaiveDateTime;
use exif::{Exif, Field, In, Tag, Value};
use photoflow_core::models::{ExtractedMetadata, GeoPoint};

/// IFDs scanned for GPS tags, in order. The primary IFD covers JPEG and most
/// containers; IFD 3 is where HEIC files park their GPS block.
const GPS_IFDS: [In; 2] = [In::PRIMARY, In(3)];

/// Timestamp tags scanned in order; the first that parses wins.
const TIMESTAMP_TAGS: [Tag; 2] = [Tag::DateTime, Tag::DateTimeOriginal];

const EXIF_TIMESTAMP_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

pub struct ExifExtractor;

impl ExifExtractor {
    /// Scan the raw upload for capture metadata.
    pub fn extract(data: &[u8]) -> ExtractedMetadata {
        let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(data)) {
            Ok(exif) => exif,
            Err(e) => {
                tracing::debug!(error = %e, "No readable EXIF container");
                return ExtractedMetadata::default();
            }
        };

        ExtractedMetadata {
            coordinates: Self::coordinates(&exif),
            captured_at: Self::captured_at(&exif),
        }
    }

    /// Find a latitude/longitude pair. Both tags must be present in the same
    /// IFD; a lone coordinate is discarded rather than paired with a default.
    /// A location whose values cannot be decoded falls through to the next
    /// IFD in the table.
    fn coordinates(exif: &Exif) -> Option<GeoPoint> {
        for ifd in GPS_IFDS {
            let (lat, lon) = match (
                exif.get_field(Tag::GPSLatitude, ifd),
                exif.get_field(Tag::GPSLongitude, ifd),
            ) {
                (Some(lat), Some(lon)) => (lat, lon),
                _ => continue,
            };

            let lat_ref = Self::hemisphere(exif, Tag::GPSLatitudeRef, ifd).unwrap_or('N');
            let lon_ref = Self::hemisphere(exif, Tag::GPSLongitudeRef, ifd).unwrap_or('E');

            match (
                dms_to_decimal(&lat.value, lat_ref),
                dms_to_decimal(&lon.value, lon_ref),
            ) {
                (Some(latitude), Some(longitude)) => {
                    return Some(GeoPoint {
                        latitude,
                        longitude,
                    });
                }
                _ => {
                    tracing::warn!(ifd = ifd.index(), "GPS tags present but not decodable");
                }
            }
        }
        None
    }

    fn captured_at(exif: &Exif) -> Option<NaiveDateTime> {
        for tag in TIMESTAMP_TAGS {
            let Some(field) = exif.get_field(tag, In::PRIMARY) else {
                continue;
            };
            let Some(raw) = ascii_value(field) else {
                tracing::warn!(tag = %tag, "Timestamp tag is not ASCII");
                continue;
            };
            match parse_exif_timestamp(&raw) {
                Some(parsed) => return Some(parsed),
                None => {
                    tracing::warn!(tag = %tag, value = %raw, "Unparseable EXIF timestamp");
                }
            }
        }
        None
    }

    fn hemisphere(exif: &Exif, tag: Tag, ifd: In) -> Option<char> {
        let field = exif.get_field(tag, ifd)?;
        ascii_value(field)?.chars().next().map(|c| c.to_ascii_uppercase())
    }
}

/// Decode a degrees/minutes/seconds rational triple into decimal degrees,
/// rounded to six places. `S` and `W` hemispheres negate the result.
pub fn dms_to_decimal(value: &Value, hemisphere: char) -> Option<f64> {
    let rationals = match value {
        Value::Rational(v) if v.len() >= 3 => v,
        _ => return None,
    };

    let degrees = rationals[0].to_f64();
    let minutes = rationals[1].to_f64();
    let seconds = rationals[2].to_f64();

    let decimal = degrees + minutes / 60.0 + seconds / 3600.0;
    if !decimal.is_finite() {
        return None;
    }

    let rounded = (decimal * 1_000_000.0).round() / 1_000_000.0;
    Some(match hemisphere {
        'S' | 'W' => -rounded,
        _ => rounded,
    })
}

/// Parse an EXIF timestamp in its `YYYY:MM:DD HH:MM:SS` layout.
pub fn parse_exif_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), EXIF_TIMESTAMP_FORMAT).ok()
}

fn ascii_value(field: &Field) -> Option<String> {
    match &field.value {
        Value::Ascii(v) => v
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string()),
        _ => None,
    }
}
