#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;

use clincell::config::{Config, Mode};
use clincell::inquiry::{FileStore, SubmissionStore};
use clincell::state::SharedState;

pub const INDEX_HTML: &str = "<!doctype html><html><body><div id=\"root\"></div></body></html>";
pub const APP_JS: &str = "console.log('clincell');";

/// A running server with its own build directory and data directory.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub state: SharedState,
    pub data_dir: TempDir,
    pub _static_dir: TempDir,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// A second visitor: same server, separate cookie jar.
    pub fn new_visitor(&self) -> Client {
        visitor_client()
    }

    pub async fn snapshot(&self) -> Value {
        let resp = self
            .client
            .get(self.url("/api/inquiry"))
            .send()
            .await
            .expect("snapshot request failed");
        assert_eq!(resp.status(), StatusCode::OK);
        resp.json().await.unwrap()
    }

    pub async fn select_form(&self, form_type: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url("/api/inquiry/form-type"))
            .json(&json!({ "formType": form_type }))
            .send()
            .await
            .expect("select form request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn set_field(&self, name: &str, value: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url("/api/inquiry/fields"))
            .json(&json!({ "name": name, "value": value }))
            .send()
            .await
            .expect("set field request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Submit the active form with extra fields in a JSON body.
    pub async fn submit(&self, fields: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/inquiry/submit"))
            .json(fields)
            .send()
            .await
            .expect("submit request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn submissions(&self) -> Value {
        let resp = self
            .client
            .get(self.url("/api/inquiry/submissions"))
            .send()
            .await
            .expect("submissions request failed");
        assert_eq!(resp.status(), StatusCode::OK);
        resp.json().await.unwrap()
    }

    pub async fn contact(&self, fields: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/contact"))
            .json(fields)
            .send()
            .await
            .expect("contact request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

pub fn visitor_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

pub fn write_build(dir: &Path) {
    std::fs::write(dir.join("index.html"), INDEX_HTML).unwrap();
    std::fs::create_dir_all(dir.join("assets")).unwrap();
    std::fs::write(dir.join("assets/app.js"), APP_JS).unwrap();
}

pub fn test_config(mode: Mode, static_dir: &Path, data_dir: &Path) -> Config {
    Config {
        mode,
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        static_dir: static_dir.to_path_buf(),
        dev_server_url: "http://127.0.0.1:9".to_string(),
        data_dir: data_dir.to_path_buf(),
        session_ttl: Duration::from_secs(1800),
        success_reset: Duration::from_secs(5),
        max_body_size: 65_536,
        log_level: "warn".to_string(),
    }
}

/// Spawn a production-mode app backed by a file store in a fresh temp dir.
pub async fn spawn_app() -> TestApp {
    let data_dir = tempfile::tempdir().expect("tempdir should create");
    let store = Arc::new(FileStore::new(data_dir.path()));
    spawn_with(store, data_dir, |_| {}).await
}

/// Spawn a production-mode app around the given store.
pub async fn spawn_app_with_store(store: Arc<dyn SubmissionStore>) -> TestApp {
    let data_dir = tempfile::tempdir().expect("tempdir should create");
    spawn_with(store, data_dir, |_| {}).await
}

pub async fn spawn_with(
    store: Arc<dyn SubmissionStore>,
    data_dir: TempDir,
    tweak: impl FnOnce(&mut Config),
) -> TestApp {
    let static_dir = tempfile::tempdir().expect("tempdir should create");
    write_build(static_dir.path());

    let mut config = test_config(Mode::Production, static_dir.path(), data_dir.path());
    tweak(&mut config);

    let (app, state) = clincell::build_app(config, store).expect("build_app failed");
    let addr = serve(app).await;

    TestApp {
        addr,
        client: visitor_client(),
        state,
        data_dir,
        _static_dir: static_dir,
    }
}

/// Bind a router to a random local port and serve it in the background.
pub async fn serve(app: axum::Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    addr
}

pub fn sponsor_fields() -> Value {
    json!({
        "companyName": "Acme",
        "contactPerson": "Jane Smith",
        "email": "jane@acme.com",
        "message": "Interested in Phase II",
    })
}
