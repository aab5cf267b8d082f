//! Drop zone engine - file intake, validation, queueing and upload
//!
//! This crate is organized into modules:
//! - `validate`: accept-list and size checks
//! - `store`: ordered record queue with capacity rules
//! - `transfer`: per-file upload state machine and HTTP transport
//! - `events`: notifications for listeners
//! - `dropzone`: the orchestrator tying it all together
//! - `config`, `error`, `file`, `messages`: supporting types

pub mod config;
pub mod dropzone;
pub mod error;
pub mod events;
pub mod file;
pub mod messages;
pub mod store;
pub mod transfer;
pub mod validate;

// Re-export the types most callers need
pub use config::DropzoneConfig;
pub use dropzone::{BatchReport, Dropzone};
pub use error::{DropzoneError, TransitionError, Warning, WarningKind};
pub use events::{DropzoneEvent, EventNotifier};
pub use file::{CandidateFile, FileContent, FileSummary};
pub use messages::{DefaultMessages, Messages};
pub use store::{Acceptance, AddOutcome, FileRecord, FileRecordStore, RecordView};
pub use transfer::{
    BodyEncoding, HttpTransport, RecordId, TransferController, TransferEvent, TransferEventKind,
    TransferReporter, TransferRequest, TransferState, TransferStatus, Transport,
};
pub use validate::{validate_size, validate_type, AcceptList, Validator};
