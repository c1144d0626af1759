use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::{AppError, ErrorDetail};
use crate::inquiry::{FormType, InquirySession, SessionSnapshot, SubmitOutcome};
use crate::parser;
use crate::sessions::SessionHandle;
use crate::state::SharedState;

pub const SESSION_COOKIE: &str = "clincell_session";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectFormTypeRequest {
    pub form_type: String,
}

#[derive(Deserialize)]
pub struct SetFieldRequest {
    pub name: String,
    pub value: String,
}

/// Resume the visitor's form, or open a fresh one and hand out its cookie.
async fn session(state: &SharedState, jar: CookieJar) -> (CookieJar, SessionHandle) {
    let existing = jar
        .get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
        .and_then(|id| state.sessions.get(id));
    if let Some(handle) = existing {
        return (jar, handle);
    }

    let opened = InquirySession::open(Arc::clone(&state.store), state.config.success_reset).await;
    let (id, handle) = state.sessions.insert(opened);
    tracing::debug!("Opened inquiry session {id}");

    let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    (jar.add(cookie), handle)
}

pub async fn show(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> (CookieJar, Json<SessionSnapshot>) {
    let (jar, handle) = session(&state, jar).await;
    let snapshot = handle.lock().await.snapshot();
    (jar, Json(snapshot))
}

pub async fn select_form_type(
    State(state): State<SharedState>,
    jar: CookieJar,
    Json(req): Json<SelectFormTypeRequest>,
) -> Result<(CookieJar, Json<SessionSnapshot>), AppError> {
    let form_type: FormType = req.form_type.parse().map_err(AppError::BadRequest)?;

    let (jar, handle) = session(&state, jar).await;
    let mut inquiry = handle.lock().await;
    inquiry.select_form_type(form_type);
    Ok((jar, Json(inquiry.snapshot())))
}

pub async fn set_field(
    State(state): State<SharedState>,
    jar: CookieJar,
    Json(req): Json<SetFieldRequest>,
) -> Result<(CookieJar, Json<SessionSnapshot>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Field name is required".to_string()));
    }

    let (jar, handle) = session(&state, jar).await;
    let mut inquiry = handle.lock().await;
    inquiry.set_field(req.name, req.value);
    Ok((jar, Json(inquiry.snapshot())))
}

/// Submit the active form. Fields sent in the body are applied first, so a
/// plain HTML form post works without prior `fields` calls.
pub async fn submit(
    State(state): State<SharedState>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let fields = parser::parse_fields(content_type, &body).map_err(AppError::BadRequest)?;

    let (jar, handle) = session(&state, jar).await;
    let mut inquiry = handle.lock().await;
    for (name, value) in fields {
        inquiry.set_field(name, value);
    }

    let outcome = inquiry.submit().await;
    let snapshot = inquiry.snapshot();

    let response = match outcome {
        SubmitOutcome::Accepted(submission) => (
            StatusCode::CREATED,
            Json(json!({
                "status": "success",
                "message": snapshot.banner,
                "submission": submission,
                "form": snapshot,
            })),
        )
            .into_response(),
        SubmitOutcome::Rejected(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "status": "error",
                "message": snapshot.banner,
                "errors": errors,
                "form": snapshot,
            })),
        )
            .into_response(),
        SubmitOutcome::Failed(err) => {
            let mut response = (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "message": snapshot.banner,
                    "form": snapshot,
                })),
            )
                .into_response();
            response
                .extensions_mut()
                .insert(ErrorDetail(err.to_string()));
            response
        }
    };

    Ok((jar, response).into_response())
}

pub async fn submissions(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> (CookieJar, Json<serde_json::Value>) {
    let (jar, handle) = session(&state, jar).await;
    let inquiry = handle.lock().await;
    let body = json!({
        "submissions": inquiry.submissions(),
        "total": inquiry.submissions().len(),
    });
    (jar, Json(body))
}
