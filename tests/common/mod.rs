//! In-process HTTP endpoint for delivery tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::routing::any;
use axum::Router;
use parking_lot::Mutex;

/// One request as the endpoint saw it
#[derive(Debug, Clone)]
pub struct Received {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: String,
}

type Responder = dyn Fn(usize, &str) -> (StatusCode, String) + Send + Sync;
type Delay = dyn Fn(usize) -> Duration + Send + Sync;

pub struct Endpoint {
    hits: AtomicUsize,
    received: Mutex<Vec<Received>>,
    delay: Box<Delay>,
    respond: Box<Responder>,
}

impl Endpoint {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<Received> {
        self.received.lock().clone()
    }
}

/// Start an endpoint whose answer depends on the zero-based hit number and
/// the request body
pub async fn serve<F>(respond: F) -> (String, Arc<Endpoint>)
where
    F: Fn(usize, &str) -> (StatusCode, String) + Send + Sync + 'static,
{
    serve_with_delay(Duration::ZERO, respond).await
}

pub async fn serve_with_delay<F>(delay: Duration, respond: F) -> (String, Arc<Endpoint>)
where
    F: Fn(usize, &str) -> (StatusCode, String) + Send + Sync + 'static,
{
    serve_with_delays(move |_| delay, respond).await
}

/// Like [`serve`], with a per-hit delay before answering
pub async fn serve_with_delays<D, F>(delay: D, respond: F) -> (String, Arc<Endpoint>)
where
    D: Fn(usize) -> Duration + Send + Sync + 'static,
    F: Fn(usize, &str) -> (StatusCode, String) + Send + Sync + 'static,
{
    let endpoint = Arc::new(Endpoint {
        hits: AtomicUsize::new(0),
        received: Mutex::new(Vec::new()),
        delay: Box::new(delay),
        respond: Box::new(respond),
    });

    let router = Router::new()
        .route("/collect", any(handle))
        .with_state(Arc::clone(&endpoint));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{addr}/collect"), endpoint)
}

async fn handle(
    State(endpoint): State<Arc<Endpoint>>,
    method: Method,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let hit = endpoint.hits.fetch_add(1, Ordering::SeqCst);
    endpoint.received.lock().push(Received {
        method,
        headers,
        body: body.clone(),
    });
    let delay = (endpoint.delay)(hit);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    (endpoint.respond)(hit, &body)
}

/// Address nothing listens on
pub async fn closed_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/collect")
}
