//! Canned HTTP server for exercising the REST adapters.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub headers: HashMap<String, String>,
    pub body: Value,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

#[derive(Clone, Default)]
struct StubState {
    responses: Arc<Mutex<VecDeque<(StatusCode, Value)>>>,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

pub struct StubServer {
    pub base_url: String,
    state: StubState,
}

impl StubServer {
    /// Answers requests in order with `responses`, whatever the path.
    pub async fn spawn(responses: Vec<(StatusCode, Value)>) -> Self {
        let state = StubState {
            responses: Arc::new(Mutex::new(responses.into())),
            captured: Arc::default(),
        };
        let app = Router::new().fallback(respond).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn request(&self, index: usize) -> CapturedRequest {
        self.state.captured.lock().unwrap()[index].clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.captured.lock().unwrap().len()
    }
}

async fn respond(State(state): State<StubState>, method: Method, uri: Uri, headers: HeaderMap, body: String) -> Response {
    let body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body).unwrap_or(Value::String(body))
    };
    state.captured.lock().unwrap().push(CapturedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().unwrap_or_default().to_string(),
        headers: headers
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect(),
        body,
    });

    let next = state.responses.lock().unwrap().pop_front();
    match next {
        Some((status, value)) => (status, axum::Json(value)).into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(json!({ "message": "stub exhausted" }))).into_response(),
    }
}
