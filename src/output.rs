//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Convert
//!
//! ```text
//! [ 30%] Analyzing image...
//! [ 60%] Converting to JPEG...
//! [ 80%] Finalizing...
//! [100%] Complete!
//! PNG → JPEG
//!     Original: 1.5 MB
//!     Converted: 312.4 KB
//!     Size: 79.7% smaller
//!     Saved: out/holiday_converted.jpeg
//! ```
//!
//! ## Check
//!
//! ```text
//! holiday.png (PNG)
//!     Type: image/png
//!     Dimensions: 1920x1080
//!     Size: 1.5 MB
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::loader::{Preview, SourceAsset};
use crate::outcome::{ConversionOutcome, format_bytes};
use crate::session::ConvertEvent;
use std::path::Path;

fn indent(line: impl AsRef<str>) -> String {
    format!("    {}", line.as_ref())
}

/// Progress line, percent right-aligned so milestones stack.
pub fn format_event(event: &ConvertEvent) -> Vec<String> {
    vec![format!(
        "[{:>3}%] {}",
        event.progress.percent, event.progress.status
    )]
}

pub fn print_event(event: &ConvertEvent) {
    for line in format_event(event) {
        println!("{}", line);
    }
}

/// "79.7% smaller", "12.5% larger" or "same size".
fn delta_phrase(delta_percent: f64) -> String {
    if delta_percent > 0.0 {
        format!("{:.1}% smaller", delta_percent)
    } else if delta_percent < 0.0 {
        format!("{:.1}% larger", -delta_percent)
    } else {
        "same size".to_string()
    }
}

pub fn format_outcome(outcome: &ConversionOutcome, saved: Option<&Path>) -> Vec<String> {
    let mut lines = vec![
        format!("{} → {}", outcome.original_format, outcome.target_format),
        indent(format!("Original: {}", format_bytes(outcome.original_size))),
        indent(format!("Converted: {}", format_bytes(outcome.new_size))),
        indent(format!("Size: {}", delta_phrase(outcome.delta_percent))),
    ];
    if let Some(path) = saved {
        lines.push(indent(format!("Saved: {}", path.display())));
    }
    lines
}

pub fn print_outcome(outcome: &ConversionOutcome, saved: Option<&Path>) {
    for line in format_outcome(outcome, saved) {
        println!("{}", line);
    }
}

pub fn format_preview(asset: &SourceAsset, preview: &Preview) -> Vec<String> {
    vec![
        format!(
            "{} ({})",
            asset.name(),
            preview.kind.name().to_ascii_uppercase()
        ),
        indent(format!("Type: {}", asset.media_type())),
        indent(format!(
            "Dimensions: {}x{}",
            preview.dimensions.width, preview.dimensions.height
        )),
        indent(format!("Size: {}", format_bytes(preview.byte_len))),
    ]
}

pub fn print_preview(asset: &SourceAsset, preview: &Preview) {
    for line in format_preview(asset, preview) {
        println!("{}", line);
    }
}
