//! Media metadata extraction.
//!
//! Turns a list of file paths into `MediaItem`s:
//!
//! - **File stats**: creation time and size from the file system
//! - **Probe**: duration and recording device from ffprobe
//! - **Batching**: a fixed number of probes in flight, per-file timeout
//!
//! A failed probe never fails the batch. The affected item comes back in
//! `Error` status with the reason attached and no duration:
//!
//! ```text
//! a.mp4  -> idle   created 10:00:00  30.0s
//! b.mp4  -> error  created 10:00:02  --     "ffprobe failed with exit code 1: ..."
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use vpm_core::extraction::{FfprobeProber, MetadataExtractor};
//!
//! let extractor = MetadataExtractor::from_settings(
//!     Arc::new(FfprobeProber::new("ffprobe")),
//!     &settings,
//! );
//! let items = extractor.extract(&paths).await;
//! ```

mod extractor;
mod probe;
mod types;

pub use extractor::MetadataExtractor;
pub use probe::{read_file_stats, FfprobeProber, FileProber};
pub use types::{ExtractionError, ExtractionResult, ProbeResult};
