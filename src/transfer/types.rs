//! Transfer state, requests and transport callback payloads

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::file::CandidateFile;

/// Stable identifier of a record. Indices shift on removal, ids never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owned by the record whose transfer it can stop. Not `Clone`: a record
/// holds at most one.
#[derive(Debug)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub(crate) fn cancel(self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Where a record is in its upload lifecycle.
///
/// Progress and the cancel handle only exist inside `InProgress`, so a
/// terminal state can never carry a stale handle.
#[derive(Debug)]
pub enum TransferState {
    NotStarted,
    InProgress { progress: f64, cancel: CancelHandle },
    Completed { response: String },
    Failed,
    Aborted,
}

impl TransferState {
    pub fn status(&self) -> TransferStatus {
        match self {
            TransferState::NotStarted => TransferStatus::NotStarted,
            TransferState::InProgress { .. } => TransferStatus::InProgress,
            TransferState::Completed { .. } => TransferStatus::Completed,
            TransferState::Failed => TransferStatus::Failed,
            TransferState::Aborted => TransferStatus::Aborted,
        }
    }

    pub fn progress(&self) -> Option<f64> {
        match self {
            TransferState::InProgress { progress, .. } => Some(*progress),
            _ => None,
        }
    }

    pub fn response(&self) -> Option<&str> {
        match self {
            TransferState::Completed { response } => Some(response),
            _ => None,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, TransferState::InProgress { .. })
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }
}

/// Data-free mirror of `TransferState` for views and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    NotStarted,
    InProgress,
    Completed,
    Failed,
    Aborted,
}

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferStatus::Completed | TransferStatus::Failed | TransferStatus::Aborted
        )
    }
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferStatus::NotStarted => write!(f, "not_started"),
            TransferStatus::InProgress => write!(f, "in_progress"),
            TransferStatus::Completed => write!(f, "completed"),
            TransferStatus::Failed => write!(f, "failed"),
            TransferStatus::Aborted => write!(f, "aborted"),
        }
    }
}

/// How the file bytes are put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyEncoding {
    /// Raw body, `Content-Type` set to the file's media type
    Binary,
    /// `multipart/form-data` with one part named after the file
    #[default]
    Multipart,
}

/// Endpoint settings shared by every transfer of a drop zone.
#[derive(Debug, Clone)]
pub struct TransferSettings {
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub encoding: BodyEncoding,
}

/// Everything a transport needs to upload one file.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub record_id: RecordId,
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub encoding: BodyEncoding,
    pub file: CandidateFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEventKind {
    Progress { loaded: u64, total: Option<u64> },
    Complete { status: u16, body: String },
    Error { message: String },
    Aborted,
}

/// Callback from a transport, addressed to one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEvent {
    pub record_id: RecordId,
    pub kind: TransferEventKind,
}

/// Handed to a transport so it can report back to the drop zone. Send
/// failures mean the drop zone is gone and are ignored.
#[derive(Debug, Clone)]
pub struct TransferReporter {
    record_id: RecordId,
    sender: UnboundedSender<TransferEvent>,
}

impl TransferReporter {
    pub(crate) fn new(record_id: RecordId, sender: UnboundedSender<TransferEvent>) -> Self {
        Self { record_id, sender }
    }

    pub fn record_id(&self) -> RecordId {
        self.record_id
    }

    fn send(&self, kind: TransferEventKind) {
        let _ = self.sender.send(TransferEvent {
            record_id: self.record_id,
            kind,
        });
    }

    pub fn progress(&self, loaded: u64, total: Option<u64>) {
        self.send(TransferEventKind::Progress { loaded, total });
    }

    pub fn complete(&self, status: u16, body: String) {
        self.send(TransferEventKind::Complete { status, body });
    }

    pub fn error(&self, message: String) {
        self.send(TransferEventKind::Error { message });
    }

    pub fn aborted(&self) {
        self.send(TransferEventKind::Aborted);
    }
}
