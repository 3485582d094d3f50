//! Change notifications.
//!
//! The coordinator reports every commit to a `ChangeSink`. Delivery is
//! fire-and-forget: a sink must not block and cannot fail the operation.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::models::{MediaItem, Pair};
use crate::processing::BatchReport;

/// Event emitted by the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum PipelineEvent {
    /// Held pairs or unpaired items changed.
    #[serde(rename_all = "camelCase")]
    CollectionsChanged {
        pairs: Vec<Pair>,
        #[serde(rename = "unpairedVideos")]
        unpaired: Vec<MediaItem>,
    },
    /// A processing batch finished.
    BatchProcessed { results: BatchReport },
    /// A processing run could not be committed.
    ProcessingError { message: String },
}

impl PipelineEvent {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CollectionsChanged { .. } => "collections-changed",
            Self::BatchProcessed { .. } => "batch-processed",
            Self::ProcessingError { .. } => "processing-error",
        }
    }
}

/// Receiver of coordinator events.
pub trait ChangeSink: Send + Sync {
    fn notify(&self, event: PipelineEvent);
}

/// Callback type for `CallbackSink`.
pub type EventCallback = Arc<dyn Fn(PipelineEvent) + Send + Sync>;

/// Sink that invokes a callback.
#[derive(Clone)]
pub struct CallbackSink {
    callback: EventCallback,
}

impl CallbackSink {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(PipelineEvent) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }
}

impl ChangeSink for CallbackSink {
    fn notify(&self, event: PipelineEvent) {
        (self.callback)(event);
    }
}

/// Sink that forwards events into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<PipelineEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PipelineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ChangeSink for ChannelSink {
    fn notify(&self, event: PipelineEvent) {
        let name = event.name();
        if self.tx.send(event).is_err() {
            tracing::trace!("Dropped {} event: receiver closed", name);
        }
    }
}

/// Sink that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ChangeSink for NullSink {
    fn notify(&self, _event: PipelineEvent) {}
}
