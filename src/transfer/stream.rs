use bytes::Bytes;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use reqwest::Body;
use std::io;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use super::types::TransferReporter;
use crate::file::{CandidateFile, FileContent};

/// Chunk size for request bodies (64 KB)
const CHUNK_SIZE: usize = 64 * 1024;

async fn chunk_source(
    file: &CandidateFile,
) -> Result<BoxStream<'static, io::Result<Bytes>>, String> {
    match file.content() {
        FileContent::Memory(data) => {
            let data = data.clone();
            let chunks: Vec<io::Result<Bytes>> = (0..data.len())
                .step_by(CHUNK_SIZE)
                .map(|start| {
                    let end = std::cmp::min(start + CHUNK_SIZE, data.len());
                    Ok(data.slice(start..end))
                })
                .collect();
            Ok(stream::iter(chunks).boxed())
        }
        FileContent::Disk(path) => {
            let handle = File::open(path)
                .await
                .map_err(|e| format!("Failed to open file: {}", e))?;
            Ok(ReaderStream::with_capacity(handle, CHUNK_SIZE).boxed())
        }
    }
}

/// Request body that reports bytes handed to the HTTP client.
///
/// Progress is reported each time the whole-number percent changes. With an
/// unknown (zero) total every chunk is reported.
pub(super) async fn progress_body(
    file: &CandidateFile,
    reporter: TransferReporter,
) -> Result<Body, String> {
    let source = chunk_source(file).await?;
    let total = Some(file.size()).filter(|size| *size > 0);

    let mut sent: u64 = 0;
    let mut last_percent: Option<u64> = None;
    let counted = source.map(move |chunk_result| {
        let chunk = chunk_result?;
        sent += chunk.len() as u64;

        match total {
            Some(total) => {
                let percent = std::cmp::min(sent * 100 / total, 100);
                if last_percent != Some(percent) {
                    last_percent = Some(percent);
                    reporter.progress(sent, Some(total));
                }
            }
            None => reporter.progress(sent, None),
        }

        Ok::<Bytes, io::Error>(chunk)
    });

    Ok(Body::wrap_stream(counted))
}
