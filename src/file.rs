//! Candidate files handed over by a drop gesture or a file picker

use bytes::Bytes;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::DropzoneError;

pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// Where the bytes of a file come from.
#[derive(Debug, Clone)]
pub enum FileContent {
    Memory(Bytes),
    Disk(PathBuf),
}

/// A file offered to the drop zone. Immutable once created.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    name: String,
    size: u64,
    media_type: String,
    content: FileContent,
}

impl CandidateFile {
    /// In-memory file; the size is the length of `data`.
    pub fn from_bytes(
        name: impl Into<String>,
        media_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            size: data.len() as u64,
            media_type: media_type.into(),
            content: FileContent::Memory(data),
        }
    }

    /// File on disk. The name is taken from the last path component and the
    /// size from the file metadata.
    pub async fn from_path(
        path: impl AsRef<Path>,
        media_type: Option<&str>,
    ) -> Result<Self, DropzoneError> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(DropzoneError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Not a file: {}", path.display()),
            )));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(Self {
            name,
            size: metadata.len(),
            media_type: media_type.unwrap_or(DEFAULT_MEDIA_TYPE).to_string(),
            content: FileContent::Disk(path.to_path_buf()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn content(&self) -> &FileContent {
        &self.content
    }

    /// Lower-cased extension including the leading dot, e.g. `".png"`.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit_once('.')
            .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
            .map(|(_, ext)| format!(".{}", ext.to_ascii_lowercase()))
    }

    pub fn summary(&self) -> FileSummary {
        FileSummary {
            name: self.name.clone(),
            size: self.size,
            media_type: self.media_type.clone(),
        }
    }
}

/// Serialisable description of a file, used in event payloads and record views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub size: u64,
    pub media_type: String,
}
