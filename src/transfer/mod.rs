//! Per-file upload lifecycle
//!
//! `TransferController` starts uploads and applies transport callbacks to a
//! record. The network side sits behind `Transport`; `HttpTransport` is the
//! reqwest implementation. Transports never touch records: they report
//! through a `TransferReporter` and the owner of the records applies those
//! events one at a time.

mod state;
mod stream;
mod types;
mod worker;

use log::info;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::error::TransitionError;
use crate::store::{Acceptance, FileRecord};

pub use types::{
    BodyEncoding, CancelHandle, RecordId, TransferEvent, TransferEventKind, TransferReporter,
    TransferRequest, TransferSettings, TransferState, TransferStatus,
};
pub use worker::HttpTransport;

/// Moves a file's bytes to an endpoint.
///
/// `dispatch` must return without waiting for the upload. Exactly one
/// terminal report (complete, error or aborted) is expected per request,
/// preceded by any number of progress reports.
pub trait Transport: Send + Sync {
    fn dispatch(
        &self,
        request: TransferRequest,
        reporter: TransferReporter,
        cancel: CancellationToken,
    );
}

pub struct TransferController {
    settings: TransferSettings,
    transport: Arc<dyn Transport>,
    events: UnboundedSender<TransferEvent>,
}

impl TransferController {
    pub fn new(
        settings: TransferSettings,
        transport: Arc<dyn Transport>,
        events: UnboundedSender<TransferEvent>,
    ) -> Self {
        Self {
            settings,
            transport,
            events,
        }
    }

    /// Begin uploading an accepted record that has not been started yet.
    pub fn start(&self, record: &mut FileRecord) -> Result<(), TransitionError> {
        if record.acceptance() != Acceptance::Accepted {
            return Err(TransitionError {
                action: "start",
                state: "not accepted",
            });
        }
        if !matches!(record.transfer, TransferState::NotStarted) {
            return Err(TransitionError {
                action: "start",
                state: "already started",
            });
        }

        let token = CancellationToken::new();
        let request = TransferRequest {
            record_id: record.id(),
            url: self.settings.url.clone(),
            method: self.settings.method.clone(),
            headers: self.settings.headers.clone(),
            encoding: self.settings.encoding,
            file: record.file().clone(),
        };
        let reporter = TransferReporter::new(record.id(), self.events.clone());

        record.transfer = TransferState::InProgress {
            progress: 0.0,
            cancel: CancelHandle::new(token.clone()),
        };
        info!(
            "transfer_start: {} {} {} {} size={}",
            record.id(),
            record.file().name(),
            self.settings.method,
            self.settings.url,
            record.file().size()
        );

        self.transport.dispatch(request, reporter, token);
        Ok(())
    }
}
