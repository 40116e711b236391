//! Before/after report for a finished conversion.

use crate::formats::media_type_label;
use crate::imaging::ConversionResult;
use crate::loader::SourceAsset;
use serde::Serialize;

/// Size and format comparison between the source and the converted file.
///
/// `delta_percent` is positive when the output is smaller (compression) and
/// negative when it grew, rounded to one decimal place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionOutcome {
    pub original_format: String,
    pub target_format: String,
    pub original_size: u64,
    pub new_size: u64,
    pub delta_percent: f64,
}

impl ConversionOutcome {
    pub fn new(asset: &SourceAsset, result: &ConversionResult) -> Self {
        let original_size = asset.byte_len();
        let new_size = result.byte_len();
        Self {
            original_format: media_type_label(asset.media_type()),
            target_format: result.target.label().to_string(),
            original_size,
            new_size,
            delta_percent: size_delta_percent(original_size, new_size),
        }
    }

    pub fn is_smaller(&self) -> bool {
        self.delta_percent > 0.0
    }
}

/// `(original - new) / original * 100`, one decimal. Zero-byte originals give 0.
pub fn size_delta_percent(original: u64, new: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    let raw = (original as f64 - new as f64) / original as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Human-readable byte count, base 1024, at most two decimals.
///
/// `0` → `0 Bytes`, `1536` → `1.5 KB`, `52428800` → `50 MB`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{SourceKind, TargetFormat};
    use crate::imaging::Strategy;
    use crate::loader::SelectedFile;

    #[test]
    fn delta_is_positive_for_compression() {
        assert_eq!(size_delta_percent(1000, 250), 75.0);
    }

    #[test]
    fn delta_is_negative_for_expansion() {
        assert_eq!(size_delta_percent(1000, 1500), -50.0);
    }

    #[test]
    fn delta_rounds_to_one_decimal() {
        assert_eq!(size_delta_percent(3, 2), 33.3);
        assert_eq!(size_delta_percent(3, 1), 66.7);
    }

    #[test]
    fn delta_for_empty_original_is_zero() {
        assert_eq!(size_delta_percent(0, 10), 0.0);
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(512), "512 Bytes");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1_234_567), "1.18 MB");
        assert_eq!(format_bytes(50 * 1024 * 1024), "50 MB");
    }

    #[test]
    fn outcome_from_asset_and_result() {
        let asset = SourceAsset::new(
            SelectedFile::new("a.png", "image/png", vec![0; 200]),
            SourceKind::Png,
        );
        let result = ConversionResult {
            bytes: vec![0; 50],
            target: TargetFormat::Jpeg,
            strategy: Strategy::Decode,
        };

        let outcome = ConversionOutcome::new(&asset, &result);
        assert_eq!(outcome.original_format, "PNG");
        assert_eq!(outcome.target_format, "JPEG");
        assert_eq!(outcome.original_size, 200);
        assert_eq!(outcome.new_size, 50);
        assert_eq!(outcome.delta_percent, 75.0);
        assert!(outcome.is_smaller());
    }

    #[test]
    fn outcome_serializes_to_json() {
        let outcome = ConversionOutcome {
            original_format: "SVG+XML".into(),
            target_format: "PNG".into(),
            original_size: 100,
            new_size: 400,
            delta_percent: -300.0,
        };
        let json: serde_json::Value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["original_format"], "SVG+XML");
        assert_eq!(json["delta_percent"], -300.0);
    }
}
