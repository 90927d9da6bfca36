//! Shared test fixtures for the packsim integration tests.
//!
//! Provides an in-process mock verification backend (an axum router on a
//! background thread), a scripted in-memory [`Transport`], and a sleeper that
//! records naps instead of taking them.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use packsim::{Outcome, ProductRecord, Sleeper, StopSignal, Transport};

// ---------------------------------------------------------------------------
// Mock backend
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    body: String,
    delay: Duration,
    received: Arc<Mutex<Vec<serde_json::Value>>>,
}

/// A running mock backend. The server thread lives until the test binary exits.
pub struct MockBackend {
    pub url: String,
    received: Arc<Mutex<Vec<serde_json::Value>>>,
}

impl MockBackend {
    /// JSON bodies received so far, in arrival order.
    pub fn received(&self) -> Vec<serde_json::Value> {
        self.received.lock().unwrap().clone()
    }
}

async fn verify(
    State(state): State<MockState>,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    state.received.lock().unwrap().push(body);
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.body.clone(),
    )
}

/// Start a backend answering every `POST /verify` with `status` and `body`.
///
/// The request must carry `Content-Type: application/json`, otherwise axum's
/// `Json` extractor answers 415 on its own.
pub fn spawn_backend(status: u16, body: &str) -> MockBackend {
    spawn_backend_with_delay(status, body, Duration::ZERO)
}

/// Like [`spawn_backend`], but every response is held back for `delay`.
pub fn spawn_backend_with_delay(status: u16, body: &str, delay: Duration) -> MockBackend {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    let received = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        status: StatusCode::from_u16(status).unwrap(),
        body: body.to_string(),
        delay,
        received: received.clone(),
    };

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            let app = Router::new()
                .route("/verify", post(verify))
                .with_state(state);
            axum::serve(listener, app).await.unwrap();
        });
    });

    MockBackend {
        url: format!("http://{addr}/verify"),
        received,
    }
}

/// An endpoint on a port nothing is listening on.
pub fn unreachable_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/verify")
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

pub fn sample_record() -> ProductRecord {
    ProductRecord {
        barcode: "891234567890".to_string(),
        weight: 250.5,
        mrp: 199.99,
        expiry: "2026-12-01T09:30:00.000+00:00".to_string(),
    }
}

// ---------------------------------------------------------------------------
// ScriptedTransport
// ---------------------------------------------------------------------------

/// Replays a fixed list of outcomes, then answers `Pass` forever.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Outcome>>,
    sent: Mutex<Vec<ProductRecord>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Outcome>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn always_pass() -> Self {
        Self::new(Vec::new())
    }

    pub fn sent(&self) -> Vec<ProductRecord> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, record: &ProductRecord) -> Outcome {
        self.sent.lock().unwrap().push(record.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Outcome::Pass(serde_json::json!({"status": "PASS"})))
    }

    fn destination(&self) -> &str {
        "scripted://backend"
    }
}

// ---------------------------------------------------------------------------
// RecordingSleeper
// ---------------------------------------------------------------------------

/// Records requested naps without sleeping. Optionally raises the stop
/// signal on the n-th nap.
#[derive(Default)]
pub struct RecordingSleeper {
    pub naps: Vec<Duration>,
    stop_on: Option<usize>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop_on(n: usize) -> Self {
        Self {
            naps: Vec::new(),
            stop_on: Some(n),
        }
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&mut self, duration: Duration, stop: &StopSignal) {
        self.naps.push(duration);
        if self.stop_on == Some(self.naps.len()) {
            stop.stop();
        }
    }
}
