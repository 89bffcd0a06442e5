//! In-process stand-in for the upstream JSON-RPC endpoint.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Router,
};

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub headers: HeaderMap,
    pub body: String,
}

pub struct MockUpstream {
    pub url: String,
    calls: Arc<AtomicUsize>,
    last: Arc<Mutex<Option<CapturedRequest>>>,
}

impl MockUpstream {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CapturedRequest> {
        self.last.lock().unwrap().clone()
    }
}

/// Serve `body` with `status` for every POST to `/jsonrpc` on an ephemeral port
pub async fn spawn_upstream(status: StatusCode, body: &'static str) -> MockUpstream {
    let calls = Arc::new(AtomicUsize::new(0));
    let last = Arc::new(Mutex::new(None));

    let handler = {
        let calls = calls.clone();
        let last = last.clone();
        move |headers: HeaderMap, payload: String| {
            let calls = calls.clone();
            let last = last.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                *last.lock().unwrap() = Some(CapturedRequest {
                    headers,
                    body: payload,
                });
                (status, [(header::CONTENT_TYPE, "application/json")], body)
            }
        }
    };

    let app = Router::new().route("/jsonrpc", post(handler));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockUpstream {
        url: format!("http://{}/jsonrpc", addr),
        calls,
        last,
    }
}

/// Defaults pointed at `url`, with a quota tests never run into
pub fn test_config(url: &str) -> Config {
    let mut config = Config::default();
    config.upstream.url = url.to_string();
    config.upstream.timeout_secs = 5;
    config.rate_limit.requests = 1_000;
    config.rate_limit.window_secs = 1;
    config.rate_limit.burst = 1_000;
    config
}
