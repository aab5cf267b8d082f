//! Drop zone notifications
//!
//! Listeners subscribe for an unbounded channel and receive every event in
//! emission order. Closed listeners are dropped on the next emit.

use log::debug;
use serde::Serialize;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::error::Warning;
use crate::file::FileSummary;
use crate::store::RecordView;
use crate::transfer::RecordId;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum DropzoneEvent {
    /// A drop gesture delivered files
    FilesDropped(Vec<FileSummary>),
    /// The file picker closed with a selection
    FilesSelected,
    /// A batch starts processing, before acceptance is known
    FilesChanged(Vec<FileSummary>),
    TransferProgress { record_id: RecordId, percent: f64 },
    TransferCompleted { record_id: RecordId, body: String },
    TransferError { record_id: RecordId, warning: Warning },
    TransferAborted { record: RecordView },
    FileRemoved { record: RecordView },
}

impl DropzoneEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DropzoneEvent::FilesDropped(_) => "files-dropped",
            DropzoneEvent::FilesSelected => "files-selected",
            DropzoneEvent::FilesChanged(_) => "files-changed",
            DropzoneEvent::TransferProgress { .. } => "transfer-progress",
            DropzoneEvent::TransferCompleted { .. } => "transfer-completed",
            DropzoneEvent::TransferError { .. } => "transfer-error",
            DropzoneEvent::TransferAborted { .. } => "transfer-aborted",
            DropzoneEvent::FileRemoved { .. } => "file-removed",
        }
    }
}

#[derive(Debug, Default)]
pub struct EventNotifier {
    listeners: Vec<UnboundedSender<DropzoneEvent>>,
}

impl EventNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<DropzoneEvent> {
        let (tx, rx) = unbounded_channel();
        self.listeners.push(tx);
        rx
    }

    pub fn emit(&mut self, event: DropzoneEvent) {
        debug!("dropzone_event: {}", event.name());
        self.listeners
            .retain(|listener| listener.send(event.clone()).is_ok());
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
