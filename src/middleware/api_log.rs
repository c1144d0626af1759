use std::time::Instant;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

use crate::config::Mode;
use crate::error::ErrorDetail;
use crate::state::SharedState;

const MAX_LINE_CHARS: usize = 300;

/// One line per `/api` request: method, path, status, latency and the JSON
/// body that went back. Page and asset traffic is not logged.
pub async fn log_api_requests(
    State(state): State<SharedState>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    if !path.starts_with("/api") {
        return next.run(req).await;
    }

    let method = req.method().clone();
    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed_ms = start.elapsed().as_millis();

    let (parts, body) = response.into_parts();
    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let (body, captured) = if captures_body(parts.status, content_type) {
        match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes).into_owned();
                (Body::from(bytes), Some(text))
            }
            Err(e) => {
                tracing::warn!("Failed to buffer response body for {path}: {e}");
                (Body::empty(), None)
            }
        }
    } else {
        (body, None)
    };

    tracing::info!(
        "{}",
        access_line(&method, &path, parts.status, elapsed_ms, captured.as_deref())
    );

    if state.config.mode != Mode::Production {
        if let Some(detail) = parts.extensions.get::<ErrorDetail>() {
            tracing::error!("{method} {path}: {}", detail.0);
        }
    }

    Response::from_parts(parts, body)
}

/// Whether the response body goes into the access line. Only JSON is
/// captured, and never a validation failure: its body echoes what the
/// visitor typed.
pub fn captures_body(status: StatusCode, content_type: Option<&str>) -> bool {
    status != StatusCode::UNPROCESSABLE_ENTITY
        && content_type.is_some_and(|ct| ct.starts_with("application/json"))
}

pub fn access_line(
    method: &Method,
    path: &str,
    status: StatusCode,
    elapsed_ms: u128,
    json_body: Option<&str>,
) -> String {
    let mut line = format!("{method} {path} {} in {elapsed_ms}ms", status.as_u16());
    if let Some(body) = json_body {
        line.push_str(" :: ");
        line.push_str(body);
    }

    if line.chars().count() > MAX_LINE_CHARS {
        let mut truncated: String = line.chars().take(MAX_LINE_CHARS - 3).collect();
        truncated.push_str("...");
        return truncated;
    }
    line
}
