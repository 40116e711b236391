//! File name handling for downloads.
//!
//! A converted file is offered as `<stem>_converted.<ext>`:
//! - `holiday.png` → JPEG → `holiday_converted.jpeg`
//! - `scan.2024.tiff` → PNG → `scan.2024_converted.png`
//! - `README` → GIF → `README_converted.gif`
//! - `.png` → BMP → `.png_converted.bmp` (leading dot is part of the stem)

use crate::formats::TargetFormat;

/// Stem used when the original name is empty.
const FALLBACK_STEM: &str = "image";

/// Result of splitting a display name into stem and extension.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFileName {
    /// Everything before the last dot (or the full name if there is none).
    pub stem: String,
    /// Text after the last dot, if any. Never includes the dot.
    pub extension: Option<String>,
}

/// Split a display name on its last dot.
///
/// A dot in first position does not start an extension, so hidden files keep
/// their whole name as the stem.
pub fn parse_file_name(name: &str) -> ParsedFileName {
    match name.rfind('.') {
        Some(pos) if pos > 0 => ParsedFileName {
            stem: name[..pos].to_string(),
            extension: Some(name[pos + 1..].to_string()),
        },
        _ => ParsedFileName {
            stem: name.to_string(),
            extension: None,
        },
    }
}

/// Suggested download name for a conversion of `original_name` to `target`.
pub fn converted_file_name(original_name: &str, target: TargetFormat) -> String {
    let parsed = parse_file_name(original_name.trim());
    let stem = if parsed.stem.is_empty() {
        FALLBACK_STEM
    } else {
        parsed.stem.as_str()
    };
    format!("{}_converted.{}", stem, target.extension())
}
