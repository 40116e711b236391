//! The conversion pipeline: asset + request → encoded bytes.
//!
//! The decode path is chosen from a `(SourceKind, TargetFormat)` table:
//!
//! | Source | Target | Strategy |
//! |---|---|---|
//! | GIF | GIF | [`Strategy::Passthrough`] (bytes unchanged, animation kept) |
//! | GIF | other | [`Strategy::FirstFrame`] (animation is dropped) |
//! | SVG | any | [`Strategy::Rasterize`] |
//! | other | any | [`Strategy::Decode`] |
//!
//! Every non-passthrough strategy then draws the bitmap onto a surface of the
//! same size at the origin. Targets without alpha (JPEG, BMP) get a surface
//! pre-filled with opaque white, so transparency flattens to white. The surface
//! is handed to the backend encoder with the request's quality for lossy
//! targets only.
//!
//! Decoded bitmaps and surfaces are owned locals; they are dropped on every
//! return path, including errors.

use super::backend::{BackendError, RasterBackend};
use super::params::ConversionRequest;
use crate::formats::{SourceKind, TargetFormat};
use crate::loader::SourceAsset;
use image::{DynamicImage, Rgba, RgbaImage, imageops};

/// Background used when flattening onto an opaque target.
pub const FLATTEN_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// How a source reaches the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Output is the input bytes, untouched.
    Passthrough,
    /// Decode only the first frame of an animation.
    FirstFrame,
    /// Rasterize vector input.
    Rasterize,
    /// Decode a raster image at its natural size.
    Decode,
}

/// Pick the decode strategy for a source/target pair.
pub fn strategy_for(source: SourceKind, target: TargetFormat) -> Strategy {
    match (source, target) {
        (SourceKind::Gif, TargetFormat::Gif) => Strategy::Passthrough,
        (SourceKind::Gif, _) => Strategy::FirstFrame,
        (SourceKind::Svg, _) => Strategy::Rasterize,
        (
            SourceKind::Jpeg
            | SourceKind::Png
            | SourceKind::Bmp
            | SourceKind::WebP
            | SourceKind::Tiff,
            _,
        ) => Strategy::Decode,
    }
}

/// Encoded output of one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub bytes: Vec<u8>,
    pub target: TargetFormat,
    pub strategy: Strategy,
}

impl ConversionResult {
    pub fn byte_len(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Draw `bitmap` at the origin of a fresh surface prepared for `target`.
///
/// Opaque targets get a white RGB surface; alpha targets keep RGBA.
pub fn prepare_surface(bitmap: RgbaImage, target: TargetFormat) -> DynamicImage {
    if target.supports_alpha() {
        // Drawing onto a transparent surface of the same size is the bitmap itself.
        return DynamicImage::ImageRgba8(bitmap);
    }
    let (width, height) = bitmap.dimensions();
    let mut surface = RgbaImage::from_pixel(width, height, FLATTEN_BACKGROUND);
    imageops::overlay(&mut surface, &bitmap, 0, 0);
    DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(surface).to_rgb8())
}

/// Convert `asset` as described by `request`.
pub fn encode(
    backend: &impl RasterBackend,
    asset: &SourceAsset,
    request: &ConversionRequest,
) -> Result<ConversionResult, BackendError> {
    let strategy = strategy_for(asset.kind(), request.target);
    tracing::debug!(
        source = %asset.kind(),
        target = %request.target,
        ?strategy,
        "pipeline strategy selected"
    );

    if strategy == Strategy::Passthrough {
        return Ok(ConversionResult {
            bytes: asset.bytes().to_vec(),
            target: request.target,
            strategy,
        });
    }

    let bitmap = backend.decode(asset)?;
    tracing::debug!(
        width = bitmap.width(),
        height = bitmap.height(),
        "source decoded"
    );

    let surface = prepare_surface(bitmap, request.target);
    let bytes = backend.encode(&surface, request.target, request.effective_quality())?;
    tracing::debug!(bytes = bytes.len(), "surface encoded");

    Ok(ConversionResult {
        bytes,
        target: request.target,
        strategy,
    })
}
