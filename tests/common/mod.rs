//! Shared fixtures: a local stand-in for the remote corpus, test config and
//! a progress reporter that remembers what it was told.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use helpsearch::config::Config;
use helpsearch::progress::ProgressReporter;
use serde_json::{json, Value};
use tempfile::TempDir;

pub const TOKEN: &str = "letmein";

#[derive(Clone)]
pub enum MockPage {
    Json(Value),
    Status(u16),
}

/// In-process corpus server serving `/search/{NN}.json`.
///
/// Unknown pages answer `404`. Every request is recorded as
/// `(method, page)` so tests can check what was probed and fetched.
#[derive(Clone, Default)]
pub struct MockCorpus {
    pages: Arc<Mutex<HashMap<u32, MockPage>>>,
    requests: Arc<Mutex<Vec<(Method, u32)>>>,
    get_delay: Arc<Mutex<Duration>>,
}

impl MockCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_page(&self, page: u32, records: Value) {
        self.pages
            .lock()
            .unwrap()
            .insert(page, MockPage::Json(records));
    }

    pub fn set_status(&self, page: u32, status: u16) {
        self.pages
            .lock()
            .unwrap()
            .insert(page, MockPage::Status(status));
    }

    /// Hold every `GET` for `delay` before answering.
    pub fn set_get_delay(&self, delay: Duration) {
        *self.get_delay.lock().unwrap() = delay;
    }

    pub fn requests(&self) -> Vec<(Method, u32)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn pages_requested(&self, method: Method) -> Vec<u32> {
        self.requests()
            .into_iter()
            .filter(|(m, _)| *m == method)
            .map(|(_, p)| p)
            .collect()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    /// Bind on an ephemeral port and return the corpus base URL.
    pub async fn start(&self) -> String {
        let app = Router::new()
            .route("/search/{file}", get(serve_page))
            .with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/search", addr)
    }
}

async fn serve_page(
    State(corpus): State<MockCorpus>,
    method: Method,
    Path(file): Path<String>,
) -> Response {
    let Some(page) = file
        .strip_suffix(".json")
        .and_then(|n| n.parse::<u32>().ok())
    else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let delay = *corpus.get_delay.lock().unwrap();
    if method == Method::GET && !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    corpus.requests.lock().unwrap().push((method, page));

    let entry = corpus.pages.lock().unwrap().get(&page).cloned();
    match entry {
        Some(MockPage::Json(records)) => Json(records).into_response(),
        Some(MockPage::Status(code)) => StatusCode::from_u16(code).unwrap().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub fn record(uri: &str, name: &str, body: &str) -> Value {
    json!({
        "uri": uri,
        "name": name,
        "src": "man",
        "description": format!("{} description", name),
        "keywords": "",
        "body": body,
    })
}

pub fn test_config(tmp: &TempDir, base_url: &str) -> Config {
    let config_content = format!(
        r#"[db]
path = "{}/data/helpsearch.sqlite"

[source]
base_url = "{}"
timeout_secs = 5

[server]
bind = "127.0.0.1:0"
update_token = "{}"
allowed_origins = ["https://helpmanual.io"]
"#,
        tmp.path().display(),
        base_url,
        TOKEN
    );
    toml::from_str(&config_content).unwrap()
}

/// Remembers every reported message.
#[derive(Default)]
pub struct CollectProgress(Mutex<Vec<String>>);

impl CollectProgress {
    pub fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages().iter().any(|m| m.contains(needle))
    }
}

impl ProgressReporter for CollectProgress {
    fn report(&self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }
}
