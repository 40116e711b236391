//! Parameter types for conversions.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (10–100, default 90). Clamped on construction.
//! - [`SvgFallback`]: Canvas size used when an SVG declares no intrinsic size.
//! - [`ConversionRequest`]: Target format + quality for one conversion.

use crate::formats::TargetFormat;

/// Quality setting for lossy image encoding (10-100).
///
/// Only JPEG and WebP encoders look at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u32);

impl Quality {
    pub const MIN: u32 = 10;
    pub const MAX: u32 = 100;

    pub fn new(value: u32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Fallback canvas for SVGs without width/height or viewBox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvgFallback {
    pub width: u32,
    pub height: u32,
}

impl Default for SvgFallback {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

/// What to produce from the loaded asset.
///
/// The source side of a conversion (bytes and [`SourceKind`]) lives on the
/// [`SourceAsset`] passed next to the request, so it is not repeated here.
///
/// [`SourceKind`]: crate::formats::SourceKind
/// [`SourceAsset`]: crate::loader::SourceAsset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionRequest {
    pub target: TargetFormat,
    pub quality: Quality,
}

impl ConversionRequest {
    pub fn new(target: TargetFormat, quality: Quality) -> Self {
        Self { target, quality }
    }

    /// Quality as the encoder sees it: `None` when the target ignores it.
    pub fn effective_quality(&self) -> Option<Quality> {
        self.target.is_lossy().then_some(self.quality)
    }
}
