//! Connection lifecycle: keep-alive, close, pipelining, bad input, shutdown

mod common;

use common::{fixture, raw_exchange, start_server, start_server_with};
use hyper::http::{Method, StatusCode};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use treeserve::config::ServeContext;

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

#[tokio::test]
async fn test_not_found_then_reuse() {
    let root = fixture();
    let server = start_server(root.path());
    let mut sender = common::connect(server.addr).await;

    let (status, _, _) = common::send(&mut sender, Method::GET, "/nope", &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, body) = common::send(&mut sender, Method::GET, "/hello.txt", &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"Hello, world!");
}

#[tokio::test]
async fn test_many_requests_one_connection() {
    let root = fixture();
    let server = start_server(root.path());
    let mut sender = common::connect(server.addr).await;

    for i in 0..20 {
        let path = if i % 2 == 0 { "/hello.txt" } else { "/docs/" };
        let (status, _, body) = common::send(&mut sender, Method::GET, path, &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body.is_empty());
    }
}

#[tokio::test]
async fn test_connection_close_honoured() {
    let root = fixture();
    let server = start_server(root.path());

    let response = raw_exchange(
        server.addr,
        b"GET /hello.txt HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n",
    )
    .await;
    let text = String::from_utf8(response).unwrap();
    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.to_ascii_lowercase().contains("connection: close\r\n"));
    assert!(text.ends_with("\r\n\r\nHello, world!"));
}

#[tokio::test]
async fn test_http10_closes_by_default() {
    let root = fixture();
    let server = start_server(root.path());

    let response = raw_exchange(server.addr, b"GET /hello.txt HTTP/1.0\r\n\r\n").await;
    let text = String::from_utf8(response).unwrap();
    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.ends_with("Hello, world!"));
}

#[tokio::test]
async fn test_pipelined_requests_answered_in_order() {
    let root = fixture();
    let server = start_server(root.path());

    let response = raw_exchange(
        server.addr,
        b"GET /hello.txt HTTP/1.1\r\nHost: x\r\n\r\n\
          GET /docs/guide.md HTTP/1.1\r\nHost: x\r\nRange: bytes=2-6\r\n\r\n\
          GET /missing HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n",
    )
    .await;
    let text = String::from_utf8(response).unwrap();

    let ok = text.find("HTTP/1.1 200 OK").unwrap();
    let partial = text.find("HTTP/1.1 206 Partial Content").unwrap();
    let missing = text.find("HTTP/1.1 404 Not Found").unwrap();
    assert!(ok < partial && partial < missing);
    assert_eq!(count(&text, "HTTP/1.1 "), 3);
    assert!(text.contains("Hello, world!"));
    assert!(text.contains("Guide"));
}

#[tokio::test]
async fn test_request_body_is_skipped() {
    let root = fixture();
    let server = start_server(root.path());

    let response = raw_exchange(
        server.addr,
        b"POST /hello.txt HTTP/1.1\r\nHost: x\r\nContent-Length: 5\r\n\r\nabcde\
          GET /hello.txt HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n",
    )
    .await;
    let text = String::from_utf8(response).unwrap();
    assert!(text.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));
    assert!(text.contains("HTTP/1.1 200 OK\r\n"));
    assert!(text.ends_with("Hello, world!"));
}

#[tokio::test]
async fn test_malformed_request_closes_without_reply() {
    let root = fixture();
    let server = start_server(root.path());

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(b"NOT A REQUEST\0\r\n\r\n").await.unwrap();

    let mut response = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .expect("connection left open");
    // A reset is as good as a close here
    if read.is_ok() {
        assert!(response.is_empty());
    }
}

#[tokio::test]
async fn test_idle_close_between_requests() {
    let root = fixture();
    let server = start_server(root.path());

    let stream = TcpStream::connect(server.addr).await.unwrap();
    drop(stream);

    // Server keeps accepting after a silent client
    let (status, _, _) = common::get(server.addr, "/hello.txt", &[]).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let root = fixture();
    let server = start_server(root.path());

    // An idle keep-alive connection must not hold shutdown forever
    let mut sender = common::connect(server.addr).await;
    let (status, _, _) = common::send(&mut sender, Method::GET, "/hello.txt", &[]).await;
    assert_eq!(status, StatusCode::OK);

    server.shutdown.notify_one();
    let result = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("acceptor did not stop");
    assert!(result.unwrap().is_ok());

    assert!(TcpStream::connect(server.addr).await.is_err());
}

fn with_timeout(root: &std::path::Path, limit: Duration) -> ServeContext {
    ServeContext {
        io_timeout: Some(limit),
        ..ServeContext::with_root(root)
    }
}

#[tokio::test]
async fn test_idle_keep_alive_times_out() {
    let root = fixture();
    let server = start_server_with(with_timeout(root.path(), Duration::from_millis(200)));

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream
        .write_all(b"GET /hello.txt HTTP/1.1\r\nHost: x\r\n\r\n")
        .await
        .unwrap();

    // Keep-alive was requested, so only the timeout can end this read
    let started = Instant::now();
    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .expect("idle connection was never closed")
        .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(150));
    let text = String::from_utf8(response).unwrap();
    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(!text.to_ascii_lowercase().contains("connection: close"));
    assert!(text.ends_with("Hello, world!"));
}

#[tokio::test]
async fn test_stalled_reader_times_out_mid_transfer() {
    const SIZE: u64 = 64 * 1024 * 1024;

    let root = tempfile::tempdir().unwrap();
    // Sparse, so the size costs no disk
    let file = std::fs::File::create(root.path().join("huge.bin")).unwrap();
    file.set_len(SIZE).unwrap();
    drop(file);
    let server = start_server_with(with_timeout(root.path(), Duration::from_millis(200)));

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream
        .write_all(b"GET /huge.bin HTTP/1.1\r\nHost: x\r\nRange: bytes=0-\r\n\r\n")
        .await
        .unwrap();

    // Stop reading long enough for the server's writable wait to expire
    tokio::time::sleep(Duration::from_millis(800)).await;

    let mut received = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(10), stream.read_to_end(&mut received))
        .await
        .expect("stalled transfer was never abandoned");
    if read.is_ok() {
        assert!(received.starts_with(b"HTTP/1.1 206 Partial Content\r\n"));
        assert!((received.len() as u64) < SIZE);
    }
}
