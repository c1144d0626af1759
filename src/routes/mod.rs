pub mod contact;
pub mod inquiry;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Inquiry form
        .route("/api/inquiry", get(inquiry::show))
        .route("/api/inquiry/form-type", put(inquiry::select_form_type))
        .route("/api/inquiry/fields", put(inquiry::set_field))
        .route("/api/inquiry/submit", post(inquiry::submit))
        .route("/api/inquiry/submissions", get(inquiry::submissions))
        // Contact page
        .route("/api/contact", post(contact::send))
}
