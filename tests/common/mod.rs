//! Shared helpers for the end-to-end tests: a server on an ephemeral port,
//! a fixture tree and a couple of client shortcuts.

#![allow(dead_code)]

use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::client::conn::http1::SendRequest;
use hyper::http::{HeaderMap, Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use treeserve::config::ServeContext;
use treeserve::server::{create_listener, run_acceptor};

/// Size of `big.bin` in the fixture tree
pub const BIG_SIZE: usize = 2 * 1024 * 1024 + 321;

pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Arc<Notify>,
    pub handle: JoinHandle<std::io::Result<()>>,
}

/// Start the acceptor for `root` on 127.0.0.1 with an ephemeral port
pub fn start_server(root: &Path) -> TestServer {
    start_server_with(ServeContext::with_root(root))
}

/// Same as [`start_server`] with a caller-built context
pub fn start_server_with(ctx: ServeContext) -> TestServer {
    let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = listener.local_addr().unwrap();
    let ctx = Arc::new(ctx);
    let shutdown = Arc::new(Notify::new());

    let handle = tokio::spawn(run_acceptor(
        listener,
        ctx,
        Arc::clone(&shutdown),
        Duration::from_millis(200),
    ));

    TestServer {
        addr,
        shutdown,
        handle,
    }
}

/// Byte at `offset` of `big.bin`
pub fn pattern_byte(offset: usize) -> u8 {
    (offset % 251) as u8
}

/// Fixture tree:
///
/// ```text
/// hello.txt          "Hello, world!"
/// empty.txt          0 bytes
/// big.bin            BIG_SIZE patterned bytes
/// my file.html       "<p>hi</p>"
/// .hidden            hidden
/// node_modules/      hidden
/// docs/guide.md
/// docs/nested/
/// ```
pub fn fixture() -> TempDir {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();

    std::fs::write(root.join("hello.txt"), b"Hello, world!").unwrap();
    std::fs::write(root.join("empty.txt"), b"").unwrap();
    let big: Vec<u8> = (0..BIG_SIZE).map(pattern_byte).collect();
    std::fs::write(root.join("big.bin"), big).unwrap();
    std::fs::write(root.join("my file.html"), b"<p>hi</p>").unwrap();
    std::fs::write(root.join(".hidden"), b"secret").unwrap();
    std::fs::create_dir(root.join("node_modules")).unwrap();
    std::fs::create_dir_all(root.join("docs/nested")).unwrap();
    std::fs::write(root.join("docs/guide.md"), b"# Guide\n").unwrap();

    tmp
}

/// HTTP/1.1 client connection driven by hyper
pub async fn connect(addr: SocketAddr) -> SendRequest<Empty<Bytes>> {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .unwrap();
    tokio::spawn(async move {
        let _ = conn.await;
    });
    sender
}

/// Send one request on an existing connection and collect the whole response
pub async fn send(
    sender: &mut SendRequest<Empty<Bytes>>,
    method: Method,
    path: &str,
    headers: &[(&str, &str)],
) -> (StatusCode, HeaderMap, Bytes) {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header("host", "localhost");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder.body(Empty::<Bytes>::new()).unwrap();

    sender.ready().await.unwrap();
    let response = sender.send_request(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, body)
}

/// One-shot GET on a fresh connection
pub async fn get(addr: SocketAddr, path: &str, headers: &[(&str, &str)]) -> (StatusCode, HeaderMap, Bytes) {
    let mut sender = connect(addr).await;
    send(&mut sender, Method::GET, path, headers).await
}

/// Write raw bytes and read until the server closes the connection
pub async fn raw_exchange(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();
    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(10), stream.read_to_end(&mut response))
        .await
        .expect("server did not close the connection")
        .unwrap();
    response
}

pub fn header<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .unwrap_or_else(|| panic!("missing header {name}"))
        .to_str()
        .unwrap()
}
