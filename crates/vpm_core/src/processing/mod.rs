//! Batch media processing.
//!
//! A `MediaTransform` processes one item; the `BatchProcessor` runs it over
//! many items with a fixed number of workers and a per-item timeout. The
//! default transform extracts each video's audio track with ffmpeg.
//!
//! Per-item lifecycle:
//!
//! ```text
//! idle ──> processing ──> processed
//!                    └──> error (reason recorded)
//! ```

mod processor;
mod transform;
mod types;

pub use processor::BatchProcessor;
pub use transform::{FfmpegAudioExtractor, MediaTransform};
pub use types::{BatchReport, ProcessedItem, ProcessingError, ProcessingResult};
