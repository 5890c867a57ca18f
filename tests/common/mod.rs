//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{to_bytes, Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use edge_gateway::config::GatewayConfig;
use edge_gateway::http::GatewayServer;
use edge_gateway::{Dispatcher, Shutdown};

/// Serve `router` on an ephemeral local port.
pub async fn start_backend(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// A request as the backend saw it.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: Method,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Clone)]
struct Recording {
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    status: StatusCode,
    reply: &'static str,
}

/// Backend that records every request and answers with a fixed status and body.
pub struct RecordingBackend {
    pub addr: SocketAddr,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl RecordingBackend {
    pub async fn start(status: StatusCode, reply: &'static str) -> Self {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let state = Recording {
            seen: seen.clone(),
            status,
            reply,
        };
        let router = Router::new().fallback(record).with_state(state);
        let addr = start_backend(router).await;
        Self { addr, seen }
    }

    pub async fn ok(reply: &'static str) -> Self {
        Self::start(StatusCode::OK, reply).await
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn last(&self) -> SeenRequest {
        self.seen.lock().unwrap().last().cloned().expect("backend saw no request")
    }
}

async fn record(State(state): State<Recording>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, usize::MAX).await.unwrap_or_default();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();

    state.seen.lock().unwrap().push(SeenRequest {
        method: parts.method,
        path_and_query,
        headers: parts.headers,
        body,
    });

    (state.status, state.reply).into_response()
}

/// Backend that writes `response` verbatim after reading the request head.
pub async fn start_raw_backend(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Backend that waits `delay` before answering.
pub async fn start_slow_backend(delay: Duration) -> SocketAddr {
    let router = Router::new().fallback(move || async move {
        tokio::time::sleep(delay).await;
        "late"
    });
    start_backend(router).await
}

/// Progress of a single slow handler invocation.
#[derive(Default)]
pub struct HandlerProgress {
    pub started: AtomicBool,
    pub completed: AtomicBool,
    pub cancelled: AtomicBool,
}

struct CancelFlag(Arc<HandlerProgress>);

impl Drop for CancelFlag {
    fn drop(&mut self) {
        if !self.0.completed.load(Ordering::SeqCst) {
            self.0.cancelled.store(true, Ordering::SeqCst);
        }
    }
}

/// Backend whose handler sleeps for `delay` and records whether it was
/// dropped before finishing.
pub async fn start_cancellable_backend(delay: Duration) -> (SocketAddr, Arc<HandlerProgress>) {
    let progress = Arc::new(HandlerProgress::default());
    let state = progress.clone();
    let router = Router::new().fallback(move || {
        let progress = state.clone();
        async move {
            progress.started.store(true, Ordering::SeqCst);
            let _flag = CancelFlag(progress.clone());
            tokio::time::sleep(delay).await;
            progress.completed.store(true, Ordering::SeqCst);
            "finished"
        }
    });
    (start_backend(router).await, progress)
}

/// Poll `condition` every 20ms until it holds or `limit` passes.
pub async fn wait_until(limit: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}

/// An address nothing is listening on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Start the gateway for `config` on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let server = GatewayServer::new(config).unwrap();
    serve(server).await
}

/// Start the gateway around a prepared dispatcher.
pub async fn start_gateway_with(config: GatewayConfig, dispatcher: Dispatcher) -> (SocketAddr, Shutdown) {
    serve(GatewayServer::with_dispatcher(config, dispatcher)).await
}

async fn serve(server: GatewayServer) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    (addr, shutdown)
}

/// Client that neither follows redirects nor uses environment proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
