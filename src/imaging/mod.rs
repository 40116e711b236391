//! Image conversion: decode, flatten, encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions`, `usvg::Tree::size` |
//! | **Decode** | `image` decoders, `resvg` for SVG |
//! | **Flatten** | `image::imageops::overlay` onto a white surface |
//! | **Encode** | `image` encoders, `webp` for lossy WebP |
//!
//! The module is split into:
//! - **Parameters**: quality, SVG fallback size, conversion request
//! - **Backend**: [`RasterBackend`] trait + [`RustBackend`]
//! - **Pipeline**: strategy dispatch and surface preparation on top of a backend

pub mod backend;
pub mod params;
pub mod pipeline;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, RasterBackend};
pub use params::{ConversionRequest, Quality, SvgFallback};
pub use pipeline::{ConversionResult, Strategy, encode, strategy_for};
pub use rust_backend::RustBackend;
