//! Embedded mock broadcaster for signaling tests

use super::OFFER_SDP;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{post, put};
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// What the create response puts in `Location`
#[derive(Debug, Clone)]
pub enum LocationMode {
    /// Absolute URL of this server's `/session/abc`
    Local,
    /// Header value sent verbatim
    Fixed(String),
    /// No header at all
    Missing,
}

/// Scripted statuses and payloads
#[derive(Debug, Clone)]
pub struct BroadcasterScript {
    pub create_status: u16,
    pub offer: String,
    pub location: LocationMode,
    pub answer_status: u16,
    pub candidate_status: u16,
    pub delete_status: u16,
}

impl Default for BroadcasterScript {
    fn default() -> Self {
        Self {
            create_status: 201,
            offer: OFFER_SDP.to_string(),
            location: LocationMode::Local,
            answer_status: 204,
            candidate_status: 204,
            delete_status: 200,
        }
    }
}

/// One request as the broadcaster saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }
}

struct BroadcasterState {
    script: BroadcasterScript,
    base_url: String,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl BroadcasterState {
    fn record(&self, method: Method, path: String, headers: &HeaderMap, body: String) {
        let header_str = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            path,
            content_type: header_str(header::CONTENT_TYPE),
            authorization: header_str(header::AUTHORIZATION),
            body,
        });
    }
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).expect("valid status code")
}

/// Mock signaling endpoint bound to 127.0.0.1 on a random port
pub struct MockBroadcaster {
    addr: SocketAddr,
    state: Arc<BroadcasterState>,
    server_handle: JoinHandle<()>,
}

impl MockBroadcaster {
    pub async fn start(script: BroadcasterScript) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get local addr");

        let state = Arc::new(BroadcasterState {
            script,
            base_url: format!("http://{}", addr),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/channel/:channel", post(create_session))
            .route(
                "/session/:id",
                put(update_session)
                    .patch(update_session)
                    .delete(update_session),
            )
            .with_state(Arc::clone(&state));

        let server_handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            server_handle,
        }
    }

    /// Root URL of the scripted channel
    pub fn root_url(&self) -> String {
        format!("http://{}/channel/test", self.addr)
    }

    /// Session URL handed out with `LocationMode::Local`
    pub fn session_url(&self) -> String {
        format!("http://{}/session/abc", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_with(&self, method: Method) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }
}

impl Drop for MockBroadcaster {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

async fn create_session(
    State(state): State<Arc<BroadcasterState>>,
    Path(channel): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Response {
    state.record(Method::POST, format!("/channel/{}", channel), &headers, body);

    let script = &state.script;
    if script.create_status != 201 {
        return status(script.create_status).into_response();
    }

    let mut response = (
        StatusCode::CREATED,
        Json(serde_json::json!({ "offer": script.offer })),
    )
        .into_response();

    let location = match &script.location {
        LocationMode::Local => Some(format!("{}/session/abc", state.base_url)),
        LocationMode::Fixed(value) => Some(value.clone()),
        LocationMode::Missing => None,
    };
    if let Some(location) = location {
        response.headers_mut().insert(
            header::LOCATION,
            HeaderValue::from_str(&location).expect("valid Location"),
        );
    }
    response
}

async fn update_session(
    State(state): State<Arc<BroadcasterState>>,
    method: Method,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    let code = match method {
        Method::PUT => state.script.answer_status,
        Method::PATCH => state.script.candidate_status,
        _ => state.script.delete_status,
    };
    state.record(method, format!("/session/{}", id), &headers, body);
    status(code)
}
