mod common;

use std::sync::Arc;

use axum::Router;
use reqwest::StatusCode;
use serde_json::{json, Value};

use clincell::config::Mode;
use clincell::inquiry::{FileStore, MemoryStore, SubmissionStore};

// ── Health & headers ────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/")).send().await.unwrap();
    let headers = resp.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["referrer-policy"], "strict-origin-when-cross-origin");
}

// ── Static assets ───────────────────────────────────────────────

#[tokio::test]
async fn serves_built_assets() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/assets/app.js")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), common::APP_JS);
}

#[tokio::test]
async fn client_routes_fall_back_to_index() {
    let app = common::spawn_app().await;

    for path in ["/", "/our-team", "/expertise", "/sponsors", "/contact", "/no-such-page"] {
        let resp = app.client.get(app.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
        assert_eq!(resp.text().await.unwrap(), common::INDEX_HTML, "{path}");
    }
}

#[tokio::test]
async fn unknown_api_route_is_json_404() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/api/pipeline")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("/api/pipeline"));
}

#[tokio::test]
async fn production_without_build_fails_to_start() {
    let static_dir = tempfile::tempdir().unwrap();
    let data_dir = tempfile::tempdir().unwrap();
    let config = common::test_config(Mode::Production, static_dir.path(), data_dir.path());

    let result = clincell::build_app(config, Arc::new(MemoryStore::new()));
    let err = result.err().expect("missing build should be rejected");
    assert!(err.contains("Could not find the build directory"));
}

// ── Development proxy ───────────────────────────────────────────

#[tokio::test]
async fn development_mode_proxies_to_bundler() {
    let bundler = Router::new().fallback(|req: axum::extract::Request| async move {
        let target = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_default();
        (
            [("x-bundler", "vite")],
            format!("{} {target}", req.method()),
        )
    });
    let bundler_addr = common::serve(bundler).await;

    let data_dir = tempfile::tempdir().unwrap();
    let app = common::spawn_with(Arc::new(MemoryStore::new()), data_dir, |config| {
        config.mode = Mode::Development;
        config.dev_server_url = format!("http://{bundler_addr}");
    })
    .await;

    let resp = app
        .client
        .get(app.url("/src/main.tsx?v=3"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-bundler"], "vite");
    assert_eq!(resp.text().await.unwrap(), "GET /src/main.tsx?v=3");

    // API routes are still answered locally.
    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn development_mode_reports_bundler_down() {
    let data_dir = tempfile::tempdir().unwrap();
    let app = common::spawn_with(Arc::new(MemoryStore::new()), data_dir, |config| {
        config.mode = Mode::Development;
        config.dev_server_url = "http://127.0.0.1:1".to_string();
    })
    .await;

    let resp = app.client.get(app.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Development server unavailable");
}

// ── Inquiry session ─────────────────────────────────────────────

#[tokio::test]
async fn first_visit_opens_sponsor_form() {
    let app = common::spawn_app().await;

    let snapshot = app.snapshot().await;
    assert_eq!(snapshot["formType"], "sponsor");
    assert_eq!(snapshot["status"], "idle");
    assert_eq!(snapshot["fields"], json!({}));
    assert_eq!(snapshot["submissionCount"], 0);
    assert_eq!(app.state.sessions.len(), 1);

    // Cookie keeps the same session.
    app.snapshot().await;
    assert_eq!(app.state.sessions.len(), 1);
}

#[tokio::test]
async fn sponsor_submission_is_accepted_and_persisted() {
    let app = common::spawn_app().await;

    let (body, status) = app.submit(&common::sponsor_fields()).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["status"], "success");
    assert_eq!(
        body["message"],
        "Thank you for your submission. We'll contact you shortly."
    );
    assert_eq!(body["submission"]["formType"], "sponsor");
    let data = &body["submission"]["data"];
    assert_eq!(data["companyName"], "Acme");
    assert_eq!(data["contactPerson"], "Jane Smith");
    assert_eq!(data["email"], "jane@acme.com");
    assert_eq!(data["message"], "Interested in Phase II");
    assert_eq!(body["form"]["fields"], json!({}));

    let listed = app.submissions().await;
    assert_eq!(listed["total"], 1);

    let raw = std::fs::read_to_string(app.data_dir.path().join("formSubmissions.json")).unwrap();
    let persisted: Vec<Value> = serde_json::from_str(&raw).unwrap();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0]["formType"], "sponsor");
    assert_eq!(persisted[0]["id"], body["submission"]["id"]);
}

#[tokio::test]
async fn patient_with_bad_email_is_rejected() {
    let app = common::spawn_app().await;

    let (_, status) = app.select_form("patient").await;
    assert_eq!(status, StatusCode::OK);

    let (body, status) = app
        .submit(&json!({
            "fullName": "John Doe",
            "email": "not-an-email",
            "phone": "555-0100",
            "message": "Looking for trial options",
        }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Please fix the highlighted errors");
    assert_eq!(body["errors"]["email"], "Please enter a valid email address");
    assert_eq!(body["form"]["errorKind"], "validation");

    let listed = app.submissions().await;
    assert_eq!(listed["total"], 0);
    assert!(!app.data_dir.path().join("formSubmissions.json").exists());
}

#[tokio::test]
async fn editing_a_field_clears_its_error() {
    let app = common::spawn_app().await;

    let (body, _) = app.submit(&json!({})).await;
    assert!(body["errors"]["companyName"].is_string());
    assert!(body["errors"]["email"].is_string());

    let (snapshot, status) = app.set_field("companyName", "Acme").await;
    assert_eq!(status, StatusCode::OK);
    assert!(snapshot["errors"].get("companyName").is_none());
    assert!(snapshot["errors"]["email"].is_string());
    assert_eq!(snapshot["fields"]["companyName"], "Acme");
}

#[tokio::test]
async fn switching_form_type_resets_form() {
    let app = common::spawn_app().await;

    app.set_field("companyName", "Acme").await;
    app.submit(&json!({})).await;

    let (snapshot, status) = app.select_form("physician").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["formType"], "physician");
    assert_eq!(snapshot["fields"], json!({}));
    assert_eq!(snapshot["errors"], json!({}));
    assert_eq!(snapshot["status"], "idle");
}

#[tokio::test]
async fn unknown_form_type_is_bad_request() {
    let app = common::spawn_app().await;

    let (body, status) = app.select_form("investor").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Unknown form type: investor");
}

#[tokio::test]
async fn empty_field_name_is_bad_request() {
    let app = common::spawn_app().await;

    let (_, status) = app.set_field("  ", "x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn urlencoded_physician_submission() {
    let app = common::spawn_app().await;
    app.select_form("physician").await;

    let resp = app
        .client
        .post(app.url("/api/inquiry/submit"))
        .form(&[
            ("fullName", "Dr. Ada Park"),
            ("institution", "General Hospital"),
            ("email", "ada@hospital.org"),
            ("specialty", "Oncology"),
            ("message", "Referral pathway"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["submission"]["formType"], "physician");
    assert_eq!(body["submission"]["data"]["specialty"], "Oncology");
    assert!(body["submission"]["data"].get("phone").is_none());
}

#[tokio::test]
async fn storage_failure_reports_error_banner() {
    let store = Arc::new(MemoryStore::new());
    store.set_fail_writes(true);
    let app = common::spawn_app_with_store(store.clone()).await;

    let (body, status) = app.submit(&common::sponsor_fields()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["message"],
        "There was an error processing your submission. Please try again."
    );
    assert_eq!(body["form"]["errorKind"], "persistence");
    // Typed values survive so the visitor can retry.
    assert_eq!(body["form"]["fields"]["companyName"], "Acme");

    // The optimistic append stays in the visitor's view only.
    assert_eq!(app.submissions().await["total"], 1);
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn new_visitor_loads_persisted_submissions() {
    let app = common::spawn_app().await;

    let (_, status) = app.submit(&common::sponsor_fields()).await;
    assert_eq!(status, StatusCode::CREATED);

    let other = app.new_visitor();
    let resp = other
        .get(app.url("/api/inquiry/submissions"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["submissions"][0]["formType"], "sponsor");
}

#[tokio::test]
async fn concurrent_visitors_do_not_drop_each_others_writes() {
    let data_dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn SubmissionStore> = Arc::new(FileStore::new(data_dir.path()));
    let app = common::spawn_with(store.clone(), data_dir, |_| {}).await;

    // Both visitors load the empty list before either submits.
    let other = app.new_visitor();
    app.snapshot().await;
    other.get(app.url("/api/inquiry")).send().await.unwrap();

    let (_, status) = app.submit(&common::sponsor_fields()).await;
    assert_eq!(status, StatusCode::CREATED);
    let resp = other
        .post(app.url("/api/inquiry/submit"))
        .json(&json!({
            "companyName": "Globex",
            "contactPerson": "Hank Scorpio",
            "email": "hank@globex.com",
            "message": "Phase I funding",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    assert_eq!(store.load().await.len(), 2);
}

// ── Contact ─────────────────────────────────────────────────────

#[tokio::test]
async fn contact_requires_fields() {
    let app = common::spawn_app().await;

    let (body, status) = app
        .contact(&json!({ "firstName": "Ann", "email": "ann@example.com" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["title"], "Missing Fields");
    assert_eq!(body["description"], "Please fill in all required fields.");
    assert_eq!(body["variant"], "destructive");
}

#[tokio::test]
async fn contact_message_is_acknowledged() {
    let app = common::spawn_app().await;

    let (body, status) = app
        .contact(&json!({
            "firstName": "Ann",
            "lastName": "Lee",
            "email": "ann@example.com",
            "subject": "media",
            "message": "Press kit please",
        }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Message Sent!");
    assert!(body.get("variant").is_none());
}

#[tokio::test]
async fn malformed_json_body_is_bad_request() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/api/contact"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().starts_with("Invalid JSON"));
}
