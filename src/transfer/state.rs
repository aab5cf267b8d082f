//! Transfer state machine
//!
//! `NotStarted -> InProgress -> {Completed, Failed, Aborted}`. Terminal states
//! are sinks. Each transition swaps the whole `TransferState`, so the cancel
//! handle leaves together with `InProgress`.

use log::{debug, info, warn};

use super::types::{TransferState, TransferStatus};
use super::TransferController;
use crate::error::{TransitionError, Warning};
use crate::store::FileRecord;

fn invalid(action: &'static str, record: &FileRecord) -> TransitionError {
    let state = match record.transfer.status() {
        TransferStatus::NotStarted => "not started",
        TransferStatus::InProgress => "in progress",
        TransferStatus::Completed => "completed",
        TransferStatus::Failed => "failed",
        TransferStatus::Aborted => "aborted",
    };
    TransitionError { action, state }
}

impl TransferController {
    /// Percent complete from transport byte counts.
    ///
    /// `None` if the total is unknown or zero; otherwise clamped to `[0, 100]`.
    pub fn percent(loaded: u64, total: Option<u64>) -> Option<f64> {
        let total = total.filter(|t| *t > 0)?;
        Some((100.0 * loaded as f64 / total as f64).clamp(0.0, 100.0))
    }

    /// Apply a progress report. Returns the new progress if it moved.
    ///
    /// Progress never goes backwards; a smaller value is dropped.
    pub fn on_progress(
        record: &mut FileRecord,
        loaded: u64,
        total: Option<u64>,
    ) -> Result<Option<f64>, TransitionError> {
        if !record.transfer.is_in_progress() {
            return Err(invalid("report progress on", record));
        }
        let Some(percent) = Self::percent(loaded, total) else {
            return Ok(None);
        };

        if let TransferState::InProgress { progress, .. } = &mut record.transfer {
            if percent <= *progress {
                return Ok(None);
            }
            *progress = percent;
        }
        debug!(
            "transfer_progress: {} percent={:.1} bytes={}",
            record.id(),
            percent,
            loaded
        );
        Ok(Some(percent))
    }

    /// The server answered. Only status 200 counts as success.
    pub fn on_complete(
        record: &mut FileRecord,
        status: u16,
        body: String,
    ) -> Result<TransferStatus, TransitionError> {
        if !record.transfer.is_in_progress() {
            return Err(invalid("complete", record));
        }

        if status == 200 {
            info!("transfer_complete: {} status={}", record.id(), status);
            record.transfer = TransferState::Completed { response: body };
            Ok(TransferStatus::Completed)
        } else {
            warn!(
                "transfer_failed: {} status={} body={}",
                record.id(),
                status,
                body
            );
            record.transfer = TransferState::Failed;
            record.warning = Some(Warning::ServerError { status });
            Ok(TransferStatus::Failed)
        }
    }

    /// The transport could not deliver the request.
    pub fn on_transport_error(
        record: &mut FileRecord,
        message: String,
    ) -> Result<(), TransitionError> {
        if !record.transfer.is_in_progress() {
            return Err(invalid("fail", record));
        }

        warn!("transfer_error: {} error={}", record.id(), message);
        record.transfer = TransferState::Failed;
        record.warning = Some(Warning::TransferFailed { message });
        Ok(())
    }

    /// Cancel the underlying transport and mark the record aborted.
    pub fn on_abort_requested(record: &mut FileRecord) -> Result<(), TransitionError> {
        match std::mem::replace(&mut record.transfer, TransferState::Aborted) {
            TransferState::InProgress { cancel, .. } => {
                cancel.cancel();
                info!("transfer_aborted: {}", record.id());
                record.warning = Some(Warning::TransferAborted);
                Ok(())
            }
            previous => {
                record.transfer = previous;
                Err(invalid("abort", record))
            }
        }
    }
}
