//! Pure Rust raster backend (plus libwebp for lossy WebP).
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, BMP, WebP, TIFF) | `image::load_from_memory_with_format` |
//! | Decode (SVG) | `resvg::usvg::Tree` parse + `resvg::render` into a `tiny_skia::Pixmap` |
//! | Identify | `image::ImageReader::into_dimensions` / `usvg::Tree::size` |
//! | Encode → PNG, BMP | `DynamicImage::write_to` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` with quality |
//! | Encode → GIF | `image::codecs::gif::GifEncoder` (single frame) |
//! | Encode → WebP | `webp::Encoder` (lossy, with quality) |
//!
//! GIF decoding asks the `image` crate for a single still image, which is the
//! first frame of an animation.

use super::backend::{BackendError, Dimensions, RasterBackend};
use super::params::{Quality, SvgFallback};
use crate::formats::{SourceKind, TargetFormat};
use crate::loader::SourceAsset;
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Frame, ImageFormat, ImageReader, Rgba, RgbaImage};
use resvg::{tiny_skia, usvg};
use std::io::Cursor;

/// Largest SVG surface we will allocate, in bytes. Matches the `image`
/// crate's default `Limits::max_alloc`, which already guards raster sources.
pub const MAX_SVG_SURFACE_BYTES: u64 = 512 * 1024 * 1024;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone)]
pub struct RustBackend {
    svg_fallback: SvgFallback,
}

impl RustBackend {
    pub fn new() -> Self {
        Self::with_svg_fallback(SvgFallback::default())
    }

    pub fn with_svg_fallback(svg_fallback: SvgFallback) -> Self {
        Self { svg_fallback }
    }

    fn parse_svg(&self, asset: &SourceAsset) -> Result<usvg::Tree, BackendError> {
        let text = std::str::from_utf8(asset.bytes())
            .map_err(|e| decode_failed(SourceKind::Svg, format!("not UTF-8 text: {e}")))?;
        let mut options = usvg::Options::default();
        if let Some(size) = usvg::Size::from_wh(
            self.svg_fallback.width as f32,
            self.svg_fallback.height as f32,
        ) {
            options.default_size = size;
        }
        usvg::Tree::from_str(text, &options)
            .map_err(|e| decode_failed(SourceKind::Svg, e.to_string()))
    }

    fn rasterize_svg(&self, asset: &SourceAsset) -> Result<RgbaImage, BackendError> {
        let tree = self.parse_svg(asset)?;
        let Dimensions { width, height } = svg_dimensions(&tree);
        let surface_bytes = u64::from(width) * u64::from(height) * 4;
        if surface_bytes > MAX_SVG_SURFACE_BYTES {
            return Err(decode_failed(
                SourceKind::Svg,
                format!("{width}x{height} surface exceeds {MAX_SVG_SURFACE_BYTES} bytes"),
            ));
        }
        let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
            decode_failed(
                SourceKind::Svg,
                format!("cannot allocate {width}x{height} surface"),
            )
        })?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        // tiny-skia stores premultiplied alpha; the rest of the pipeline expects straight.
        let mut bitmap = RgbaImage::new(width, height);
        for (dst, src) in bitmap.pixels_mut().zip(pixmap.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Ok(bitmap)
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_failed(kind: SourceKind, reason: impl Into<String>) -> BackendError {
    BackendError::DecodeFailed {
        kind,
        reason: reason.into(),
    }
}

fn encode_failed(target: TargetFormat, reason: impl Into<String>) -> BackendError {
    BackendError::EncodeFailed {
        target,
        reason: reason.into(),
    }
}

/// Pixel size of a parsed SVG, rounded up, at least 1x1.
fn svg_dimensions(tree: &usvg::Tree) -> Dimensions {
    let size = tree.size();
    Dimensions {
        width: (size.width().ceil() as u32).max(1),
        height: (size.height().ceil() as u32).max(1),
    }
}

fn raster_format(kind: SourceKind) -> Result<ImageFormat, BackendError> {
    kind.image_format()
        .ok_or_else(|| decode_failed(kind, "no raster decoder for this format"))
}

/// Encode lossy WebP via libwebp. The `image` crate only writes lossless WebP.
fn encode_webp(surface: &DynamicImage, quality: Option<Quality>) -> Result<Vec<u8>, BackendError> {
    let rgba = surface.to_rgba8();
    let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
    let quality = quality.unwrap_or_default().value() as f32;
    let memory = encoder
        .encode_simple(false, quality)
        .map_err(|e| encode_failed(TargetFormat::WebP, format!("{e:?}")))?;
    Ok(memory.to_vec())
}

impl RasterBackend for RustBackend {
    fn identify(&self, asset: &SourceAsset) -> Result<Dimensions, BackendError> {
        let kind = asset.kind();
        if kind == SourceKind::Svg {
            return self.parse_svg(asset).map(|tree| svg_dimensions(&tree));
        }
        let reader = ImageReader::with_format(Cursor::new(asset.bytes()), raster_format(kind)?);
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| decode_failed(kind, format!("Failed to read dimensions: {e}")))?;
        Ok(Dimensions { width, height })
    }

    fn decode(&self, asset: &SourceAsset) -> Result<RgbaImage, BackendError> {
        let kind = asset.kind();
        if kind == SourceKind::Svg {
            return self.rasterize_svg(asset);
        }
        image::load_from_memory_with_format(asset.bytes(), raster_format(kind)?)
            .map(|img| img.to_rgba8())
            .map_err(|e| decode_failed(kind, e.to_string()))
    }

    fn encode(
        &self,
        surface: &DynamicImage,
        target: TargetFormat,
        quality: Option<Quality>,
    ) -> Result<Vec<u8>, BackendError> {
        let mut buf = Vec::new();
        let written = match target {
            TargetFormat::Png => surface.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png),
            TargetFormat::Bmp => surface.write_to(&mut Cursor::new(&mut buf), ImageFormat::Bmp),
            TargetFormat::Jpeg => {
                let q = quality.unwrap_or_default().value() as u8;
                surface.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, q))
            }
            TargetFormat::Gif => {
                let mut encoder = GifEncoder::new(&mut buf);
                encoder.encode_frame(Frame::new(surface.to_rgba8()))
            }
            TargetFormat::WebP => return encode_webp(surface, quality),
        };
        written.map_err(|e| encode_failed(target, e.to_string()))?;

        if buf.is_empty() {
            return Err(encode_failed(target, "encoder produced no output"));
        }
        Ok(buf)
    }
}
