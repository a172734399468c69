//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, Response, StatusCode},
    Router,
};
use lb_proxy::config::{BackendConfig, ProxyConfig};
use lb_proxy::health::HealthTracker;
use lb_proxy::{BackendRegistry, HttpServer, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A running proxy plus the handles tests need to inspect it.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub registry: Arc<BackendRegistry>,
    pub health: Arc<HealthTracker>,
    pub shutdown: Shutdown,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config pointing at `backends`, with health checks off unless a test turns them on.
pub fn config_for(backends: &[SocketAddr]) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.backends = backends
        .iter()
        .map(|addr| BackendConfig {
            host: addr.ip().to_string(),
            port: addr.port(),
        })
        .collect();
    config.health_check.enabled = false;
    config
}

/// Start the proxy on an ephemeral port.
pub async fn spawn_proxy(config: ProxyConfig) -> TestProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config);
    let registry = server.registry();
    let health = server.health();
    let shutdown = Shutdown::new();

    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestProxy {
        addr,
        registry,
        health,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// An address nothing is listening on.
pub fn unused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Serve `router` on `addr` (use port 0 for an ephemeral port).
pub async fn start_backend_on(addr: SocketAddr, router: Router) -> SocketAddr {
    let listener = TcpListener::bind(addr).await.unwrap();
    let local = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    local
}

pub async fn start_backend(router: Router) -> SocketAddr {
    start_backend_on("127.0.0.1:0".parse().unwrap(), router).await
}

/// Backend that echoes the request body and reports what it received in
/// `x-echo-method`, `x-echo-uri` and `x-echo-test` response headers.
pub fn echo_router() -> Router {
    Router::new().fallback(echo)
}

async fn echo(request: Request<Body>) -> Response<Body> {
    let method = request.method().to_string();
    let uri = request.uri().to_string();
    let test_header = request.headers().get("x-test").cloned();

    let body = axum::body::to_bytes(request.into_body(), usize::MAX)
        .await
        .unwrap();

    let mut builder = Response::builder()
        .header("x-echo-method", method)
        .header("x-echo-uri", uri);
    if let Some(value) = test_header {
        builder = builder.header("x-echo-test", value);
    }
    builder.body(Body::from(body)).unwrap()
}

/// Backend answering every request with the current `status` and `tag` as body.
pub fn status_router(tag: &'static str, status: Arc<AtomicU16>) -> Router {
    Router::new()
        .fallback(|State((tag, status)): State<(&'static str, Arc<AtomicU16>)>| async move {
            let code = StatusCode::from_u16(status.load(Ordering::SeqCst)).unwrap();
            (code, tag)
        })
        .with_state((tag, status))
}

/// Backend that always answers 200 with `tag`.
pub async fn start_tagged_backend(tag: &'static str) -> SocketAddr {
    start_backend(status_router(tag, Arc::new(AtomicU16::new(200)))).await
}

/// Raw TCP backend: reads the request head, then hands the socket to `f`.
pub async fn start_raw_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(TcpStream) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = Arc::clone(&f);
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let mut head = Vec::new();
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                f(socket).await;
            });
        }
    });

    addr
}

/// Backend that sends headers promising 100 bytes, writes a few, then hangs up.
pub async fn start_truncating_backend() -> SocketAddr {
    start_raw_backend(|mut socket| async move {
        let _ = socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\npartial")
            .await;
        let _ = socket.flush().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
    })
    .await
}

/// Backend that accepts, reads the request, then closes without answering.
pub async fn start_hangup_backend() -> SocketAddr {
    start_raw_backend(|socket| async move {
        drop(socket);
    })
    .await
}

/// Backend that accepts connections and never answers.
pub async fn start_black_hole() -> SocketAddr {
    start_raw_backend(|socket| async move {
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(socket);
    })
    .await
}

/// Poll `check` until it holds or `deadline` passes.
pub async fn eventually<F: Fn() -> bool>(deadline: Duration, check: F) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    check()
}
