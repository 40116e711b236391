//! Raster backend trait and shared types.
//!
//! The [`RasterBackend`] trait stands in for a platform drawing surface: it
//! can identify an image, decode it to an RGBA bitmap, and encode a prepared
//! surface into a target format. Everything format-agnostic (strategy choice,
//! alpha flattening, drawing) lives in the [`pipeline`](super::pipeline) so
//! that it runs unchanged against the mock backend in tests.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::Quality;
use crate::formats::{SourceKind, TargetFormat};
use crate::loader::SourceAsset;
use image::{DynamicImage, RgbaImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to decode {kind} image: {reason}")]
    DecodeFailed { kind: SourceKind, reason: String },
    #[error("Failed to encode {target}: {reason}")]
    EncodeFailed { target: TargetFormat, reason: String },
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for raster backends.
///
/// Implementations must be `Sync` so a conversion can run on a worker thread
/// while the caller keeps the backend.
pub trait RasterBackend: Sync {
    /// Natural pixel dimensions of the asset.
    fn identify(&self, asset: &SourceAsset) -> Result<Dimensions, BackendError>;

    /// Decode the asset into a bitmap at its natural size.
    ///
    /// Animated sources yield their first frame.
    fn decode(&self, asset: &SourceAsset) -> Result<RgbaImage, BackendError>;

    /// Encode a prepared surface. `quality` is `Some` only for lossy targets.
    fn encode(
        &self,
        surface: &DynamicImage,
        target: TargetFormat,
        quality: Option<Quality>,
    ) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock backend that records operations and returns canned results.
    /// Uses Mutex (not RefCell) so it is Sync and can cross into a worker thread.
    pub struct MockBackend {
        pub dimensions: Dimensions,
        pub encoded_len: usize,
        pub fail_decode: bool,
        pub fail_encode: bool,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(SourceKind),
        Decode(SourceKind),
        Encode {
            target: TargetFormat,
            quality: Option<u32>,
            width: u32,
            height: u32,
            has_alpha: bool,
        },
    }

    impl Default for MockBackend {
        fn default() -> Self {
            Self::with_dimensions(Dimensions {
                width: 4,
                height: 3,
            })
        }
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(dimensions: Dimensions) -> Self {
            Self {
                dimensions,
                encoded_len: 16,
                fail_decode: false,
                fail_encode: false,
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn failing_decode() -> Self {
            Self {
                fail_decode: true,
                ..Self::default()
            }
        }

        pub fn failing_encode() -> Self {
            Self {
                fail_encode: true,
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl RasterBackend for MockBackend {
        fn identify(&self, asset: &SourceAsset) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(asset.kind()));
            Ok(self.dimensions)
        }

        fn decode(&self, asset: &SourceAsset) -> Result<RgbaImage, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Decode(asset.kind()));
            if self.fail_decode {
                return Err(BackendError::DecodeFailed {
                    kind: asset.kind(),
                    reason: "mock decode failure".into(),
                });
            }
            // Fully transparent, so flattening is observable.
            Ok(RgbaImage::new(self.dimensions.width, self.dimensions.height))
        }

        fn encode(
            &self,
            surface: &DynamicImage,
            target: TargetFormat,
            quality: Option<Quality>,
        ) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                target,
                quality: quality.map(Quality::value),
                width: surface.width(),
                height: surface.height(),
                has_alpha: surface.color().has_alpha(),
            });
            if self.fail_encode {
                return Err(BackendError::EncodeFailed {
                    target,
                    reason: "mock encoder returned no output".into(),
                });
            }
            Ok(vec![0xAB; self.encoded_len])
        }
    }

    fn png_asset() -> SourceAsset {
        SourceAsset::new(
            crate::loader::SelectedFile::new("x.png", "image/png", vec![1, 2, 3]),
            SourceKind::Png,
        )
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(Dimensions {
            width: 800,
            height: 600,
        });

        let result = backend.identify(&png_asset()).unwrap();
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 600);

        let ops = backend.get_operations();
        assert_eq!(ops, vec![RecordedOp::Identify(SourceKind::Png)]);
    }

    #[test]
    fn mock_decode_yields_transparent_bitmap() {
        let backend = MockBackend::new();
        let bitmap = backend.decode(&png_asset()).unwrap();
        assert_eq!(bitmap.dimensions(), (4, 3));
        assert!(bitmap.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn mock_records_encode() {
        let backend = MockBackend::new();
        let surface = DynamicImage::new_rgb8(10, 5);

        let bytes = backend
            .encode(&surface, TargetFormat::Jpeg, Some(Quality::new(80)))
            .unwrap();
        assert_eq!(bytes.len(), 16);

        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Encode {
                target: TargetFormat::Jpeg,
                quality: Some(80),
                width: 10,
                height: 5,
                has_alpha: false,
            }]
        );
    }

    #[test]
    fn mock_failures_surface_as_backend_errors() {
        let decode = MockBackend::failing_decode().decode(&png_asset());
        assert!(matches!(decode, Err(BackendError::DecodeFailed { .. })));

        let encode = MockBackend::failing_encode().encode(
            &DynamicImage::new_rgba8(1, 1),
            TargetFormat::Png,
            None,
        );
        assert!(matches!(encode, Err(BackendError::EncodeFailed { .. })));
    }
}
