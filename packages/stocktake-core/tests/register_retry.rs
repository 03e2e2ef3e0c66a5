//! Dispatcher behavior against a scripted inventory endpoint.
//!
//! A plain TCP listener plays the inventory API: it serves one canned
//! HTTP response per connection, in order, then goes away. The retry
//! policy's delays are shrunk to keep the tests fast.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use stocktake_core::classify::classify;
use stocktake_core::{
    AssetRecord, AuthScheme, ExistingAssetIndex, HostFingerprint, InventoryClient, InventoryError,
    RetryPolicy,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn response(status_line: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    )
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Serve the given responses, one connection each, counting the hits.
async fn scripted_inventory(responses: Vec<String>) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        for body in responses {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            counter.fetch_add(1, Ordering::SeqCst);

            // Drain the full request before answering
            let mut buf = vec![0u8; 16 * 1024];
            let mut total = 0;
            loop {
                let Ok(n) = socket.read(&mut buf[total..]).await else {
                    break;
                };
                if n == 0 {
                    break;
                }
                total += n;

                if let Some(headers_end) = find_subslice(&buf[..total], b"\r\n\r\n") {
                    let headers = String::from_utf8_lossy(&buf[..headers_end]);
                    let content_length = headers
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if total >= headers_end + 4 + content_length {
                        break;
                    }
                }

                if total == buf.len() {
                    buf.resize(buf.len() * 2, 0);
                }
            }

            let _ = socket.write_all(body.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{addr}"), hits)
}

fn sample_record() -> AssetRecord {
    let mut fingerprint = HostFingerprint::unknown("10.0.0.9");
    fingerprint.mac = "08:00:27:AA:BB:CC".to_string();
    fingerprint.os = "Ubuntu 22.04".to_string();
    let class = classify(&fingerprint.os, &fingerprint.model);
    AssetRecord::compose(&fingerprint, &class, "SER-001".to_string())
}

fn fast_policy(max_tries: u32) -> RetryPolicy {
    RetryPolicy {
        max_tries,
        base_delay: Duration::from_millis(1),
    }
}

#[tokio::test]
async fn registration_rides_out_transient_contention() {
    let (root, hits) = scripted_inventory(vec![
        response("503 Service Unavailable", "{\"error\":\"busy\"}"),
        response("503 Service Unavailable", "{\"error\":\"busy\"}"),
        response("201 Created", "{}"),
    ])
    .await;

    let client = InventoryClient::new(&root, AuthScheme::Anonymous).unwrap();
    let result = client.register_asset(&sample_record(), &fast_policy(5)).await;

    assert!(result.is_ok());
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn lock_hint_in_body_is_retried() {
    let (root, hits) = scripted_inventory(vec![
        response("500 Internal Server Error", "SQLITE_BUSY: database is Locked"),
        response("200 OK", "{}"),
    ])
    .await;

    let client = InventoryClient::new(&root, AuthScheme::Anonymous).unwrap();
    let result = client.register_asset(&sample_record(), &fast_policy(5)).await;

    assert!(result.is_ok());
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unauthorized_fails_fast_without_backoff() {
    let (root, hits) = scripted_inventory(vec![response("401 Unauthorized", "{}")]).await;

    // A policy with a long base delay proves no backoff was taken
    let policy = RetryPolicy {
        max_tries: 5,
        base_delay: Duration::from_secs(30),
    };

    let client = InventoryClient::new(&root, AuthScheme::Anonymous).unwrap();
    let started = Instant::now();
    let result = client.register_asset(&sample_record(), &policy).await;

    assert!(matches!(result, Err(InventoryError::Unauthorized)));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn other_rejections_are_terminal_on_first_sight() {
    let (root, hits) = scripted_inventory(vec![response(
        "400 Bad Request",
        "{\"error\":\"missing assetId\"}",
    )])
    .await;

    let client = InventoryClient::new(&root, AuthScheme::Anonymous).unwrap();
    let result = client.register_asset(&sample_record(), &fast_policy(5)).await;

    match result {
        Err(InventoryError::Rejected { status, .. }) => assert_eq!(status, 400),
        other => panic!("expected a terminal rejection, got {other:?}"),
    }
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn exhausted_retries_surface_the_last_cause() {
    let (root, hits) = scripted_inventory(vec![
        response("503 Service Unavailable", "{}"),
        response("503 Service Unavailable", "{}"),
        response("503 Service Unavailable", "{}"),
    ])
    .await;

    let client = InventoryClient::new(&root, AuthScheme::Anonymous).unwrap();
    let result = client.register_asset(&sample_record(), &fast_policy(3)).await;

    match result {
        Err(InventoryError::RetriesExhausted { tries, source }) => {
            assert_eq!(tries, 3);
            assert!(matches!(*source, InventoryError::Rejected { status: 503, .. }));
        }
        other => panic!("expected exhausted retries, got {other:?}"),
    }
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn transport_failures_are_retried_then_wrapped() {
    // Bind-and-drop yields an address that refuses connections
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let root = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = InventoryClient::new(&root, AuthScheme::Anonymous).unwrap();
    let result = client.register_asset(&sample_record(), &fast_policy(2)).await;

    match result {
        Err(InventoryError::RetriesExhausted { tries, source }) => {
            assert_eq!(tries, 2);
            assert!(matches!(*source, InventoryError::Transport(_)));
        }
        other => panic!("expected exhausted retries, got {other:?}"),
    }
}

#[tokio::test]
async fn next_id_answer_is_passed_through() {
    let (root, _) = scripted_inventory(vec![response("200 OK", "{\"id\":\"PC-044\"}")]).await;

    let client = InventoryClient::new(&root, AuthScheme::Anonymous).unwrap();
    assert_eq!(client.next_asset_id("PC").await.as_deref(), Some("PC-044"));
}

#[tokio::test]
async fn next_id_failures_degrade_to_none() {
    let (root, _) = scripted_inventory(vec![
        response("503 Service Unavailable", "{}"),
        response("200 OK", "not json"),
    ])
    .await;

    let client = InventoryClient::new(&root, AuthScheme::Anonymous).unwrap();
    assert_eq!(client.next_asset_id("PC").await, None);
    assert_eq!(client.next_asset_id("PC").await, None);
}

#[tokio::test]
async fn asset_listing_seeds_the_dedup_index() {
    let body = r#"[
        {"assetId":"PC-001","macAddress":"2C:3A:FD:11:22:33","ipAddress":"10.0.0.5"},
        {"assetId":"PC-002","macAddress":null,"ipAddress":"10.0.0.6"},
        {"assetId":"PC-003","macAddress":"Unknown","ipAddress":null}
    ]"#;
    let (root, _) = scripted_inventory(vec![response("200 OK", body)]).await;

    let client = InventoryClient::new(&root, AuthScheme::Anonymous).unwrap();
    let index = ExistingAssetIndex::load(Some(&client)).await;

    assert!(index.is_duplicate("2C:3A:FD:11:22:33", "10.9.9.9"));
    assert!(index.is_duplicate("Unknown", "10.0.0.6"));
    // The sentinel MAC from the listing was not indexed
    assert!(!index.is_duplicate("Unknown", "10.9.9.9"));
}

#[tokio::test]
async fn unauthorized_listing_degrades_to_an_empty_index() {
    let (root, _) = scripted_inventory(vec![response("401 Unauthorized", "{}")]).await;

    let client = InventoryClient::new(&root, AuthScheme::Anonymous).unwrap();
    let index = ExistingAssetIndex::load(Some(&client)).await;

    assert!(!index.is_duplicate("2C:3A:FD:11:22:33", "10.0.0.5"));
}
