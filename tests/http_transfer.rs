use std::collections::BTreeMap;
use std::time::Duration;

use dropzone::{
    Acceptance, CandidateFile, Dropzone, DropzoneConfig, DropzoneEvent, TransferStatus, Warning,
};
use tokio::sync::mpsc::UnboundedReceiver;
use wiremock::matchers::{body_bytes, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(url: String, binary: bool) -> DropzoneConfig {
    DropzoneConfig {
        max_files: 3,
        accept: "image/*".to_string(),
        url: Some(url),
        binary,
        ..Default::default()
    }
}

fn drain(rx: &mut UnboundedReceiver<DropzoneEvent>) -> Vec<DropzoneEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

async fn wait_idle(dz: &mut Dropzone) {
    tokio::time::timeout(Duration::from_secs(10), dz.wait_idle())
        .await
        .expect("transfers did not finish");
}

#[tokio::test]
async fn binary_upload_sends_raw_bytes_with_headers() {
    let server = MockServer::start().await;
    let data = vec![42u8; 1024];
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header("content-type", "image/png"))
        .and(header("x-token", "secret"))
        .and(body_bytes(data.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let mut headers = BTreeMap::new();
    headers.insert("X-Token".to_string(), "secret".to_string());
    let mut dz = Dropzone::new(DropzoneConfig {
        headers,
        ..config(format!("{}/upload", server.uri()), true)
    })
    .unwrap();
    let mut rx = dz.subscribe();

    let report = dz.files_dropped(vec![CandidateFile::from_bytes("a.png", "image/png", data)]);
    assert_eq!(report.transfers_started, 1);
    wait_idle(&mut dz).await;

    let record = &dz.records()[0];
    assert_eq!(record.status(), TransferStatus::Completed);
    assert_eq!(record.transfer().response(), Some("ok"));

    let events = drain(&mut rx);
    assert!(events.contains(&DropzoneEvent::TransferCompleted {
        record_id: record.id(),
        body: "ok".to_string(),
    }));
}

#[tokio::test]
async fn multipart_upload_names_the_part_after_the_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains("name=\"cat.png\""))
        .and(body_string_contains("filename=\"cat.png\""))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"id\":1}"))
        .expect(1)
        .mount(&server)
        .await;

    let mut dz = Dropzone::new(config(format!("{}/upload", server.uri()), false)).unwrap();
    dz.files_selected(vec![CandidateFile::from_bytes(
        "cat.png",
        "image/png",
        b"meow".to_vec(),
    )]);
    wait_idle(&mut dz).await;

    assert_eq!(dz.records()[0].status(), TransferStatus::Completed);
    assert_eq!(dz.records()[0].transfer().response(), Some("{\"id\":1}"));
}

#[tokio::test]
async fn progress_is_non_decreasing_and_bounded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut dz = Dropzone::new(config(server.uri(), true)).unwrap();
    let mut rx = dz.subscribe();
    dz.files_dropped(vec![CandidateFile::from_bytes(
        "big.png",
        "image/png",
        vec![0u8; 300 * 1024],
    )]);
    wait_idle(&mut dz).await;

    let progress: Vec<f64> = drain(&mut rx)
        .into_iter()
        .filter_map(|event| match event {
            DropzoneEvent::TransferProgress { percent, .. } => Some(percent),
            _ => None,
        })
        .collect();

    assert!(progress.len() > 1);
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert!(progress.iter().all(|p| (0.0..=100.0).contains(p)));
    assert_eq!(*progress.last().unwrap(), 100.0);
}

#[tokio::test]
async fn file_on_disk_is_streamed_with_configured_method() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_string("stored"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("scan.png");
    let contents: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    tokio::fs::write(&file_path, &contents).await.unwrap();
    let file = CandidateFile::from_path(&file_path, Some("image/png"))
        .await
        .unwrap();

    let mut dz = Dropzone::new(DropzoneConfig {
        method: "put".to_string(),
        ..config(format!("{}/files", server.uri()), true)
    })
    .unwrap();
    dz.files_dropped(vec![file]);
    wait_idle(&mut dz).await;

    assert_eq!(dz.records()[0].status(), TransferStatus::Completed);
    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].body, contents);
}

#[tokio::test]
async fn non_200_response_fails_with_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let mut dz = Dropzone::new(config(server.uri(), true)).unwrap();
    let mut rx = dz.subscribe();
    dz.files_dropped(vec![CandidateFile::from_bytes("a.png", "image/png", vec![1u8; 16])]);
    wait_idle(&mut dz).await;

    let record = &dz.records()[0];
    assert_eq!(record.status(), TransferStatus::Failed);
    assert_eq!(record.warning(), Some(&Warning::ServerError { status: 500 }));

    let events = drain(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, DropzoneEvent::TransferError { .. })));
    assert!(!events
        .iter()
        .any(|e| matches!(e, DropzoneEvent::TransferCompleted { .. })));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transfer_error() {
    // Bind and release a port so nothing is listening on it.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut dz = Dropzone::new(config(format!("http://127.0.0.1:{}/upload", port), true)).unwrap();
    dz.files_dropped(vec![CandidateFile::from_bytes("a.png", "image/png", vec![1u8; 16])]);
    wait_idle(&mut dz).await;

    let record = &dz.records()[0];
    assert_eq!(record.status(), TransferStatus::Failed);
    assert!(matches!(
        record.warning(),
        Some(Warning::TransferFailed { .. })
    ));
    assert_eq!(record.warning().unwrap().to_string(), "transfer error");
}

#[tokio::test]
async fn removing_a_running_upload_aborts_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("too late")
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let mut dz = Dropzone::new(config(server.uri(), true)).unwrap();
    let mut rx = dz.subscribe();
    dz.files_dropped(vec![
        CandidateFile::from_bytes("a.png", "image/png", vec![1u8; 16]),
        CandidateFile::from_bytes("b.txt", "text/plain", vec![1u8; 16]),
    ]);
    assert_eq!(dz.records()[1].acceptance(), Acceptance::Rejected);
    assert_eq!(dz.in_flight(), 1);

    let removed = dz.request_removal(0).unwrap();
    assert_eq!(removed.status(), TransferStatus::Aborted);
    assert_eq!(removed.warning(), Some(&Warning::TransferAborted));
    assert_eq!(dz.records().len(), 1);

    // The transport acknowledges the cancellation; the record is already gone.
    let applied = tokio::time::timeout(Duration::from_secs(5), dz.drive())
        .await
        .expect("transport did not acknowledge abort");
    assert!(!applied);

    let names: Vec<&str> = drain(&mut rx).iter().map(DropzoneEvent::name).collect();
    assert!(names.contains(&"transfer-aborted"));
    assert!(!names.contains(&"transfer-completed"));
    assert!(!names.contains(&"transfer-error"));
    assert!(!names.contains(&"file-removed"));
}

async fn second_upload_cookie(with_credentials: bool) -> Option<String> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "session=abc123; Path=/"),
        )
        .mount(&server)
        .await;

    let mut dz = Dropzone::new(DropzoneConfig {
        with_credentials,
        ..config(format!("{}/upload", server.uri()), true)
    })
    .unwrap();
    dz.files_dropped(vec![CandidateFile::from_bytes("a.png", "image/png", vec![1u8; 16])]);
    wait_idle(&mut dz).await;
    dz.files_dropped(vec![CandidateFile::from_bytes("b.png", "image/png", vec![2u8; 16])]);
    wait_idle(&mut dz).await;

    assert!(dz
        .records()
        .iter()
        .all(|r| r.status() == TransferStatus::Completed));
    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert!(received[0].headers.get("cookie").is_none());
    received[1]
        .headers
        .get("cookie")
        .map(|v| v.to_str().unwrap().to_string())
}

#[tokio::test]
async fn credentials_send_back_endpoint_cookies() {
    assert_eq!(
        second_upload_cookie(true).await.as_deref(),
        Some("session=abc123")
    );
}

#[tokio::test]
async fn cookies_are_not_kept_without_credentials() {
    assert_eq!(second_upload_cookie(false).await, None);
}

#[tokio::test]
async fn binary_upload_without_media_type_omits_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut dz = Dropzone::new(DropzoneConfig {
        accept: "*".to_string(),
        ..config(server.uri(), true)
    })
    .unwrap();
    dz.files_dropped(vec![CandidateFile::from_bytes("blob", "", vec![7u8; 32])]);
    wait_idle(&mut dz).await;

    assert_eq!(dz.records()[0].status(), TransferStatus::Completed);
    let received = server.received_requests().await.unwrap();
    assert!(received[0].headers.get("content-type").is_none());
    assert_eq!(received[0].body, vec![7u8; 32]);
}
