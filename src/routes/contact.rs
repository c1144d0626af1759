use axum::body::Bytes;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::contact::{self, ContactMessage};
use crate::error::AppError;
use crate::parser;

pub async fn send(headers: HeaderMap, body: Bytes) -> Result<Response, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let fields = parser::parse_fields(content_type, &body).map_err(AppError::BadRequest)?;
    let msg = ContactMessage::from_fields(&fields);

    match contact::review(&msg) {
        Ok(toast) => {
            tracing::info!("Contact message received: {}", msg.subject_label());
            Ok((StatusCode::OK, Json(toast)).into_response())
        }
        Err(toast) => Ok((StatusCode::BAD_REQUEST, Json(toast)).into_response()),
    }
}
