//! Shared test utilities: synthetic images built in memory.
//!
//! No fixture files. Every source image a test needs is encoded on the fly
//! with the `image` crate, so tests control exact sizes and colours.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let png = solid_png(4, 3, [255, 0, 0, 255]);
//! session
//!     .select_file(SelectedFile::new("red.png", "image/png", png))
//!     .unwrap();
//! ```

use image::codecs::gif::GifEncoder;
use image::{Delay, Frame, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

// =========================================================================
// Bitmaps
// =========================================================================

pub fn solid_rgba(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(color))
}

/// Horizontal red ramp, vertical green ramp, alpha fading left to right.
pub fn gradient_rgba(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        Rgba([r, g, 128, 255 - r / 2])
    })
}

// =========================================================================
// Encoded sources
// =========================================================================

pub fn encode_rgba(image: &RgbaImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn solid_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    encode_rgba(&solid_rgba(width, height, color), ImageFormat::Png)
}

/// A GIF with one solid-colour frame per entry in `colors`.
pub fn animated_gif(colors: &[[u8; 4]], width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buf);
        for &color in colors {
            let frame = Frame::from_parts(
                solid_rgba(width, height, color),
                0,
                0,
                Delay::from_numer_denom_ms(100, 1),
            );
            encoder.encode_frame(frame).unwrap();
        }
    }
    buf
}

/// A filled SVG rectangle. `None` omits width, height and viewBox entirely.
pub fn svg_square(size: Option<(u32, u32)>, fill: &str) -> String {
    let dims = match size {
        Some((w, h)) => format!(r#" width="{w}" height="{h}""#),
        None => String::new(),
    };
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg"{dims}><rect x="0" y="0" width="100%" height="100%" fill="{fill}"/></svg>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn animated_gif_has_all_frames() {
        use image::AnimationDecoder;
        use image::codecs::gif::GifDecoder;

        let bytes = animated_gif(&[[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255]], 2, 2);
        let frames = GifDecoder::new(Cursor::new(bytes))
            .unwrap()
            .into_frames()
            .collect_frames()
            .unwrap();
        assert_eq!(frames.len(), 3);
    }

    #[test]
    fn svg_square_sizes() {
        assert!(svg_square(Some((4, 5)), "red").contains(r#"width="4" height="5""#));
        assert!(!svg_square(None, "red").contains("viewBox"));
    }
}
