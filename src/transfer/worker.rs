//! HTTP transport - one spawned task per upload

use log::{debug, info, warn};
use reqwest::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use super::stream::progress_body;
use super::types::{BodyEncoding, TransferReporter, TransferRequest};
use super::Transport;
use crate::error::DropzoneError;

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// `with_credentials` keeps cookies set by the endpoint and sends them
    /// back on later uploads.
    pub fn new(with_credentials: bool) -> Result<Self, DropzoneError> {
        let client = Client::builder().cookie_store(with_credentials).build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn dispatch(
        &self,
        request: TransferRequest,
        reporter: TransferReporter,
        cancel: CancellationToken,
    ) {
        let Ok(runtime) = Handle::try_current() else {
            warn!("http_transfer_error: {} no tokio runtime", request.record_id);
            reporter.error("no async runtime available".to_string());
            return;
        };
        let client = self.client.clone();
        runtime.spawn(async move {
            run_transfer(client, request, reporter, cancel).await;
        });
    }
}

async fn run_transfer(
    client: Client,
    request: TransferRequest,
    reporter: TransferReporter,
    cancel: CancellationToken,
) {
    let record_id = request.record_id;

    let result = tokio::select! {
        _ = cancel.cancelled() => {
            info!("http_transfer_cancelled: {}", record_id);
            reporter.aborted();
            return;
        }
        result = send_request(&client, &request, &reporter) => result,
    };

    match result {
        Ok((status, body)) => {
            debug!("http_transfer_response: {} status={}", record_id, status);
            reporter.complete(status, body);
        }
        Err(e) => {
            warn!("http_transfer_error: {} error={}", record_id, e);
            reporter.error(e);
        }
    }
}

async fn send_request(
    client: &Client,
    request: &TransferRequest,
    reporter: &TransferReporter,
) -> Result<(u16, String), String> {
    let file = &request.file;
    let body = progress_body(file, reporter.clone()).await?;

    let mut headers = request.headers.clone();
    let builder = match request.encoding {
        BodyEncoding::Binary => {
            if !file.media_type().is_empty() {
                if let Ok(value) = HeaderValue::from_str(file.media_type()) {
                    headers.insert(CONTENT_TYPE, value);
                }
            }
            headers.insert(CONTENT_LENGTH, HeaderValue::from(file.size()));
            client
                .request(request.method.clone(), &request.url)
                .headers(headers)
                .body(body)
        }
        BodyEncoding::Multipart => {
            let mut part = Part::stream_with_length(body, file.size())
                .file_name(file.name().to_string());
            if !file.media_type().is_empty() {
                part = part
                    .mime_str(file.media_type())
                    .map_err(|e| format!("Invalid media type {}: {}", file.media_type(), e))?;
            }
            let form = Form::new().part(file.name().to_string(), part);
            client
                .request(request.method.clone(), &request.url)
                .headers(headers)
                .multipart(form)
        }
    };

    let response = builder
        .send()
        .await
        .map_err(|e| format!("Upload request failed: {}", e))?;

    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| format!("Failed to read response: {}", e))?;

    Ok((status, text))
}
