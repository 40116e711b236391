//! # imgshift
//!
//! A single-file image format converter. Pick a source image, pick a target
//! format and quality, get back the converted bytes and a before/after report.
//!
//! # Architecture: One Session, One Conversion
//!
//! ```text
//! 1. Admit     SelectedFile  →  SourceAsset        (type allowlist + size limit)
//! 2. Convert   SourceAsset   →  ConversionResult   (decode → flatten → encode)
//! 3. Download  result        →  <stem>_converted.<ext>
//! ```
//!
//! All three steps run through [`session::Session`], a small state machine
//! (`Idle → Loaded → Converting → Completed | Failed`). Decoding and encoding
//! go through the [`imaging::RasterBackend`] trait so the orchestration can be
//! tested against a recording mock without touching real codecs.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`formats`] | Source kinds, target formats, media-type tables |
//! | [`validation`] | Admission checks: size limit, type allowlist |
//! | [`loader`] | Reading files from disk, the admitted `SourceAsset`, preview |
//! | [`imaging`] | Backend trait, pure-Rust backend, conversion pipeline |
//! | [`session`] | Conversion state machine, progress events, stale-result guard |
//! | [`naming`] | Download file names |
//! | [`outcome`] | Size delta report and human-readable byte counts |
//! | [`save`] | Where downloads are written |
//! | [`config`] | `config.toml` loading, validation, merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## GIF Stays GIF Byte-for-Byte
//!
//! Re-encoding a GIF through a single bitmap would drop every frame after the
//! first. GIF → GIF therefore copies the source bytes untouched, while GIF →
//! anything else takes the first frame only. Multi-frame re-encoding is out of
//! scope.
//!
//! ## White Behind Transparency
//!
//! JPEG and BMP have no alpha channel. Sources are composited onto opaque
//! white before encoding to those targets, so transparent regions come out
//! white rather than black.
//!
//! ## Stale Results Are Dropped, Not Cancelled
//!
//! A running conversion cannot be interrupted. Instead every result carries
//! the session generation it was started under; resetting or selecting a new
//! file bumps the generation, and [`session::Session::finish`] discards
//! anything that no longer matches.
//!
//! ## Pure-Rust Codecs
//!
//! Raster formats go through the `image` crate, lossy WebP through `webp`, and
//! SVG through `resvg`. No system image libraries are required.

pub mod config;
pub mod formats;
pub mod imaging;
pub mod loader;
pub mod naming;
pub mod outcome;
pub mod output;
pub mod save;
pub mod session;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_helpers;
