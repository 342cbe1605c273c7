pub mod assessments;
pub mod health;
pub mod submissions;

use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::Router;
use uuid::Uuid;

use crate::AppState;

/// Caller identity comes from the upstream gateway's `x-user-id` header;
/// auth itself lives outside this service. Absent or unparseable header
/// maps to the nil user.
pub(crate) fn caller_id(headers: &HeaderMap) -> Uuid {
    headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
        .unwrap_or_else(Uuid::nil)
}

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/assessments/generate",
            post(assessments::generate_assessment),
        )
        .route("/api/assessments", get(assessments::list_assessments))
        .route("/api/assessments/:id", get(assessments::get_assessment))
        .route(
            "/api/submissions/:id",
            post(submissions::submit_answers).get(submissions::get_submission),
        )
        .route(
            "/api/submissions/assessment/:id",
            get(submissions::list_for_assessment),
        )
}
