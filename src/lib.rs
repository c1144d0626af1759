pub mod assets;
pub mod config;
pub mod contact;
pub mod error;
pub mod inquiry;
pub mod middleware;
pub mod parser;
pub mod routes;
pub mod sessions;
pub mod state;

use std::any::Any;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::assets::Assets;
use crate::config::Config;
use crate::error::AppError;
use crate::inquiry::SubmissionStore;
use crate::middleware::api_log::log_api_requests;
use crate::sessions::SessionRegistry;
use crate::state::{AppState, SharedState};

/// Assemble the router. Fails when the configured asset source is unusable,
/// e.g. production mode without a built client.
pub fn build_app(
    config: Config,
    store: Arc<dyn SubmissionStore>,
) -> Result<(Router, SharedState), String> {
    let assets = Assets::from_config(&config)?;
    let max_body_size = config.max_body_size;

    let state: SharedState = Arc::new(AppState {
        config,
        store,
        sessions: SessionRegistry::new(),
        assets,
    });

    let app = Router::new()
        .merge(routes::api_routes())
        .route("/health", get(health))
        .fallback(assets::serve)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            log_api_requests,
        ))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state.clone());

    Ok((app, state))
}

async fn health() -> &'static str {
    "ok"
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    AppError::Internal(format!("handler panicked: {detail}")).into_response()
}
