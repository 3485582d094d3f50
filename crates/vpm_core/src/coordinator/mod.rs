//! Pipeline coordinator.
//!
//! Single owner of the held collections. Each operation follows the same
//! shape:
//!
//! ```text
//! lock ─> clone current snapshot ─> edit ─> validate ─> store.save ─> swap ─> notify
//! ```
//!
//! Long-running work (probing at ingest, the processing batch) happens
//! outside the lock; its results are merged into the snapshot current at
//! commit time.
//!
//! # Usage
//!
//! ```ignore
//! let coordinator = Coordinator::from_settings(&settings, prober, transform, store, sink)?;
//! coordinator.ingest(&paths, true).await?;
//! let report = coordinator.process(&ids).await?;
//! ```

mod errors;
mod service;

pub use errors::{CoordinatorError, CoordinatorResult};
pub use service::{Coordinator, IngestSummary};
