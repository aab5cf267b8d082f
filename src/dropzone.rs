//! Drop zone orchestrator
//!
//! Takes batches of candidate files from a drop gesture or a file picker,
//! validates and queues them, starts one upload per accepted file when an
//! endpoint is configured and tells listeners about every milestone.
//!
//! All record mutation goes through `&mut self`. Uploads run elsewhere and
//! only send `TransferEvent`s, which are applied one at a time by
//! `apply_transfer_event` (usually through `drive`).

use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use crate::config::DropzoneConfig;
use crate::error::{DropzoneError, Warning};
use crate::events::{DropzoneEvent, EventNotifier};
use crate::file::CandidateFile;
use crate::store::{Acceptance, AddOutcome, FileRecord, FileRecordStore, RecordView};
use crate::transfer::{
    HttpTransport, RecordId, TransferController, TransferEvent, TransferEventKind, TransferStatus,
    Transport,
};

/// What happened to one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Records created, in arrival order (rejected files included)
    pub added: Vec<RecordId>,
    pub transfers_started: usize,
    /// Candidates left out after the queue filled up
    pub dropped: usize,
    /// Batch level warning, also available through `Dropzone::warning`
    pub warning: Option<Warning>,
    /// The drop zone is disabled and did not look at the batch
    pub ignored: bool,
}

pub struct Dropzone {
    config: DropzoneConfig,
    store: FileRecordStore,
    controller: Option<TransferController>,
    notifier: EventNotifier,
    transfer_events: UnboundedReceiver<TransferEvent>,
    warning: Option<Warning>,
}

impl Dropzone {
    /// Build a drop zone that uploads over HTTP.
    pub fn new(config: DropzoneConfig) -> Result<Self, DropzoneError> {
        let transport = HttpTransport::new(config.with_credentials)?;
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(
        config: DropzoneConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, DropzoneError> {
        config.validate()?;

        let (tx, rx) = unbounded_channel();
        let controller = config
            .transfer_settings()?
            .map(|settings| TransferController::new(settings, transport, tx));
        let store = FileRecordStore::new(config.max_files, config.validator());

        info!(
            "dropzone_init: max_files={} accept={} upload={}",
            config.max_files,
            config.accept,
            controller.is_some()
        );

        Ok(Self {
            config,
            store,
            controller,
            notifier: EventNotifier::new(),
            transfer_events: rx,
            warning: None,
        })
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<DropzoneEvent> {
        self.notifier.subscribe()
    }

    pub fn config(&self) -> &DropzoneConfig {
        &self.config
    }

    pub fn records(&self) -> &[FileRecord] {
        self.store.records()
    }

    pub fn snapshot(&self) -> Vec<RecordView> {
        self.store.snapshot()
    }

    /// Warning for the last batch as a whole. Cleared when the next batch arrives.
    pub fn warning(&self) -> Option<&Warning> {
        self.warning.as_ref()
    }

    pub fn show_file_list(&self) -> bool {
        self.config.show_file_list
    }

    pub fn in_flight(&self) -> usize {
        self.store.in_flight()
    }

    /// Files delivered by a drag-and-drop gesture.
    pub fn files_dropped(&mut self, files: Vec<CandidateFile>) -> BatchReport {
        if self.config.disabled || self.config.drag_disabled {
            debug!("files_dropped_ignored: count={}", files.len());
            return BatchReport {
                ignored: true,
                ..Default::default()
            };
        }
        self.notifier.emit(DropzoneEvent::FilesDropped(
            files.iter().map(CandidateFile::summary).collect(),
        ));
        self.handle_incoming_files(files)
    }

    /// Files chosen in the file picker.
    pub fn files_selected(&mut self, files: Vec<CandidateFile>) -> BatchReport {
        if self.config.disabled {
            debug!("files_selected_ignored: count={}", files.len());
            return BatchReport {
                ignored: true,
                ..Default::default()
            };
        }
        self.notifier.emit(DropzoneEvent::FilesSelected);
        self.handle_incoming_files(files)
    }

    /// Validate, queue and (if an endpoint is set) start uploading a batch.
    ///
    /// Outside a tokio runtime `HttpTransport` uploads fail straight away.
    pub fn handle_incoming_files(&mut self, files: Vec<CandidateFile>) -> BatchReport {
        let mut report = BatchReport::default();
        if self.config.disabled {
            report.ignored = true;
            return report;
        }

        self.warning = None;
        self.notifier.emit(DropzoneEvent::FilesChanged(
            files.iter().map(CandidateFile::summary).collect(),
        ));

        if !self.store.is_multiple() && files.len() > 1 {
            warn!("batch_rejected: {} files in single mode", files.len());
            self.warning = Some(Warning::MultipleFilesNotAllowed);
            report.warning = self.warning.clone();
            return report;
        }

        let total = files.len();
        for (position, file) in files.into_iter().enumerate() {
            if !self.store.is_multiple() {
                self.abort_replaced_transfer();
            }

            let id = match self.store.add(file) {
                AddOutcome::CapacityExceeded => {
                    report.dropped = total - position;
                    warn!(
                        "batch_capacity_exceeded: max_files={} dropped={}",
                        self.store.capacity(),
                        report.dropped
                    );
                    self.warning = Some(Warning::MaxFilesExceeded);
                    report.warning = self.warning.clone();
                    break;
                }
                AddOutcome::Appended { id, .. } | AddOutcome::Replaced { id, .. } => id,
            };
            report.added.push(id);

            let (Some(controller), Some(record)) = (&self.controller, self.store.get_mut(id))
            else {
                continue;
            };
            if record.acceptance() != Acceptance::Accepted {
                continue;
            }
            match controller.start(record) {
                Ok(()) => report.transfers_started += 1,
                Err(e) => warn!("transfer_start_failed: {} error={}", id, e),
            }
        }

        info!(
            "batch_processed: added={} started={} dropped={}",
            report.added.len(),
            report.transfers_started,
            report.dropped
        );
        report
    }

    /// Single selection: the record about to be replaced may still be uploading.
    fn abort_replaced_transfer(&mut self) {
        let Some(record) = self.store.get_mut_at(0) else {
            return;
        };
        if TransferController::on_abort_requested(record).is_ok() {
            let view = record.view();
            self.notifier
                .emit(DropzoneEvent::TransferAborted { record: view });
        }
    }

    /// Remove the record at `index`, aborting its upload if one is running.
    ///
    /// Returns `None` for an out-of-range index, or when `closable` is off and
    /// the record was accepted. Nothing is emitted in either case.
    pub fn request_removal(&mut self, index: usize) -> Option<FileRecord> {
        let record = self.store.get_mut_at(index)?;
        if !self.config.closable && record.acceptance() == Acceptance::Accepted {
            debug!("removal_refused: {} not closable", record.id());
            return None;
        }

        let aborted = TransferController::on_abort_requested(record).is_ok();
        let removed = self.store.remove(index)?;
        let view = removed.view();
        if aborted {
            self.notifier
                .emit(DropzoneEvent::TransferAborted { record: view });
        } else {
            info!("file_removed: {} {}", removed.id(), removed.file().name());
            self.notifier.emit(DropzoneEvent::FileRemoved { record: view });
        }
        Some(removed)
    }

    /// Abort every running upload. Records stay in the queue.
    pub fn abort_all(&mut self) -> usize {
        let mut views = Vec::new();
        for record in self.store.records_mut() {
            if TransferController::on_abort_requested(record).is_ok() {
                views.push(record.view());
            }
        }
        let count = views.len();
        for view in views {
            self.notifier
                .emit(DropzoneEvent::TransferAborted { record: view });
        }
        count
    }

    /// Apply one transport callback. Returns `false` if it was ignored
    /// because the record is gone or no longer uploading.
    pub fn apply_transfer_event(&mut self, event: TransferEvent) -> bool {
        let TransferEvent { record_id, kind } = event;
        let Some(record) = self.store.get_mut(record_id) else {
            debug!("transfer_event_ignored: {} record removed", record_id);
            return false;
        };

        let applied = match kind {
            TransferEventKind::Progress { loaded, total } => {
                TransferController::on_progress(record, loaded, total).map(|moved| {
                    if let Some(percent) = moved {
                        self.notifier
                            .emit(DropzoneEvent::TransferProgress { record_id, percent });
                    }
                })
            }
            TransferEventKind::Complete { status, body } => {
                TransferController::on_complete(record, status, body).map(|outcome| {
                    let event = match (outcome, record.transfer.response()) {
                        (TransferStatus::Completed, Some(response)) => {
                            DropzoneEvent::TransferCompleted {
                                record_id,
                                body: response.to_string(),
                            }
                        }
                        _ => DropzoneEvent::TransferError {
                            record_id,
                            warning: record
                                .warning
                                .clone()
                                .unwrap_or(Warning::ServerError { status }),
                        },
                    };
                    self.notifier.emit(event);
                })
            }
            TransferEventKind::Error { message } => {
                TransferController::on_transport_error(record, message.clone()).map(|()| {
                    self.notifier.emit(DropzoneEvent::TransferError {
                        record_id,
                        warning: Warning::TransferFailed { message },
                    });
                })
            }
            TransferEventKind::Aborted => {
                TransferController::on_abort_requested(record).map(|()| {
                    let view = record.view();
                    self.notifier
                        .emit(DropzoneEvent::TransferAborted { record: view });
                })
            }
        };

        match applied {
            Ok(()) => true,
            Err(e) => {
                debug!("transfer_event_ignored: {} {}", record_id, e);
                false
            }
        }
    }

    /// Apply every callback already queued without waiting. Returns how
    /// many were applied.
    pub fn apply_pending_transfer_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.transfer_events.try_recv() {
            if self.apply_transfer_event(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for one transport callback and apply it.
    pub async fn drive(&mut self) -> bool {
        match self.transfer_events.recv().await {
            Some(event) => self.apply_transfer_event(event),
            None => false,
        }
    }

    /// Apply callbacks until no upload is in flight.
    ///
    /// There is no timeout: a transfer that never reports keeps this waiting.
    pub async fn wait_idle(&mut self) {
        while self.store.in_flight() > 0 {
            let Some(event) = self.transfer_events.recv().await else {
                break;
            };
            self.apply_transfer_event(event);
        }
    }
}

impl Drop for Dropzone {
    fn drop(&mut self) {
        for record in self.store.records_mut() {
            let _ = TransferController::on_abort_requested(record);
        }
    }
}
