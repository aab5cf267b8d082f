//! Warning and error types
//!
//! Intake and transfer problems are ordinary values (`Warning`) stored on a
//! record or on the drop zone itself. Only construction of a `Dropzone` and
//! misuse of the transfer state machine produce real errors.

use serde::Serialize;
use thiserror::Error;

use crate::messages::Messages;

/// Category a warning belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    Validation,
    Capacity,
    Selection,
    Transfer,
    Cancellation,
}

/// Human readable reason attached to a record or to a rejected batch.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Warning {
    #[error("type not accepted")]
    TypeNotAccepted,
    #[error("size exceeded")]
    SizeExceeded,
    #[error("max files exceeded")]
    MaxFilesExceeded,
    #[error("multiple files not allowed")]
    MultipleFilesNotAllowed,
    #[error("server error")]
    ServerError { status: u16 },
    #[error("transfer error")]
    TransferFailed { message: String },
    #[error("transfer aborted")]
    TransferAborted,
}

impl Warning {
    pub fn kind(&self) -> WarningKind {
        match self {
            Warning::TypeNotAccepted | Warning::SizeExceeded => WarningKind::Validation,
            Warning::MaxFilesExceeded => WarningKind::Capacity,
            Warning::MultipleFilesNotAllowed => WarningKind::Selection,
            Warning::ServerError { .. } | Warning::TransferFailed { .. } => WarningKind::Transfer,
            Warning::TransferAborted => WarningKind::Cancellation,
        }
    }

    /// Localisation key used to look up the display string
    pub fn key(&self) -> &'static str {
        match self {
            Warning::TypeNotAccepted => "dropzone.type_not_accepted",
            Warning::SizeExceeded => "dropzone.size_exceeded",
            Warning::MaxFilesExceeded => "dropzone.max_files_exceeded",
            Warning::MultipleFilesNotAllowed => "dropzone.multiple_files_not_allowed",
            Warning::ServerError { .. } => "dropzone.server_error",
            Warning::TransferFailed { .. } => "dropzone.transfer_error",
            Warning::TransferAborted => "dropzone.transfer_aborted",
        }
    }

    /// Display string from `messages`, falling back to the built-in English text.
    pub fn message(&self, messages: &dyn Messages) -> String {
        messages
            .lookup(self.key())
            .unwrap_or_else(|| self.to_string())
    }
}

/// Errors raised while building a `Dropzone`.
#[derive(Debug, Error)]
pub enum DropzoneError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),
    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

/// A transfer callback arrived while the record was in a state that does not accept it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action} a transfer that is {state}")]
pub struct TransitionError {
    pub action: &'static str,
    pub state: &'static str,
}
