//! Source and target format tags.
//!
//! Incoming files are identified by their *declared* media type (what a file
//! picker or the extension says), never by sniffing the bytes. The declared
//! type is parsed once into a [`SourceKind`]; everything downstream dispatches
//! on that tag instead of comparing strings.
//!
//! | Media type | SourceKind | Decoder |
//! |---|---|---|
//! | `image/jpeg`, `image/jpg` | `Jpeg` | `image` crate |
//! | `image/png` | `Png` | `image` crate |
//! | `image/gif` | `Gif` | `image` crate (first frame) |
//! | `image/bmp` | `Bmp` | `image` crate |
//! | `image/webp` | `WebP` | `image` crate |
//! | `image/tiff` | `Tiff` | `image` crate |
//! | `image/svg+xml` | `Svg` | `resvg` |
//!
//! TIFF and SVG are input-only: there is no [`TargetFormat`] for them.

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every declared media type the converter accepts.
pub const SUPPORTED_MEDIA_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/bmp",
    "image/webp",
    "image/tiff",
    "image/svg+xml",
];

/// Media type reported for files whose extension we don't recognise.
pub const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// Decoded-from format of a source asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Jpeg,
    Png,
    Gif,
    Bmp,
    WebP,
    Tiff,
    Svg,
}

impl SourceKind {
    /// Parse a declared media type. Case-insensitive; `;`-parameters are ignored.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "image/bmp" => Some(Self::Bmp),
            "image/webp" => Some(Self::WebP),
            "image/tiff" => Some(Self::Tiff),
            "image/svg+xml" => Some(Self::Svg),
            _ => None,
        }
    }

    /// The `image` crate decoder for this kind. `None` for vector sources.
    pub fn image_format(self) -> Option<ImageFormat> {
        match self {
            Self::Jpeg => Some(ImageFormat::Jpeg),
            Self::Png => Some(ImageFormat::Png),
            Self::Gif => Some(ImageFormat::Gif),
            Self::Bmp => Some(ImageFormat::Bmp),
            Self::WebP => Some(ImageFormat::WebP),
            Self::Tiff => Some(ImageFormat::Tiff),
            Self::Svg => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::WebP => "webp",
            Self::Tiff => "tiff",
            Self::Svg => "svg",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output format of a conversion.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    #[default]
    Png,
    #[value(alias = "jpg")]
    #[serde(alias = "jpg")]
    Jpeg,
    #[value(name = "webp")]
    WebP,
    Gif,
    Bmp,
}

impl TargetFormat {
    pub const ALL: [TargetFormat; 5] = [
        TargetFormat::Png,
        TargetFormat::Jpeg,
        TargetFormat::WebP,
        TargetFormat::Gif,
        TargetFormat::Bmp,
    ];

    /// File extension used for the downloaded file.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::WebP => "webp",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
        }
    }

    /// Upper-case label shown in reports and status text.
    pub fn label(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::WebP => "WEBP",
            Self::Gif => "GIF",
            Self::Bmp => "BMP",
        }
    }

    /// Whether the encoded file can carry transparency.
    ///
    /// JPEG and BMP cannot, so sources are flattened onto white first.
    pub fn supports_alpha(self) -> bool {
        !matches!(self, Self::Jpeg | Self::Bmp)
    }

    /// Whether the quality setting changes the encoder's output.
    pub fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg | Self::WebP)
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for TargetFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::WebP),
            "gif" => Ok(Self::Gif),
            "bmp" => Ok(Self::Bmp),
            other => Err(format!("unknown target format: {other}")),
        }
    }
}

/// Map a file extension to the media type a browser would declare for it.
pub fn media_type_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" | "jpe" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "txt" => "text/plain",
        _ => UNKNOWN_MEDIA_TYPE,
    }
}

/// Report label for a declared media type: the subtype, upper-cased.
///
/// `image/svg+xml` → `SVG+XML`, `image/jpeg` → `JPEG`.
pub fn media_type_label(media_type: &str) -> String {
    let essence = media_type.split(';').next().unwrap_or("").trim();
    let subtype = essence.rsplit('/').next().unwrap_or(essence);
    subtype.to_ascii_uppercase()
}
