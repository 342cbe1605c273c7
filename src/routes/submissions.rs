use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use uuid::Uuid;

use crate::dto::assessment_dto::SubmitAnswersPayload;
use crate::error::Error;
use crate::routes::caller_id;
use crate::AppState;

#[axum::debug_handler]
pub async fn submit_answers(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(assessment_id): Path<Uuid>,
    Json(payload): Json<SubmitAnswersPayload>,
) -> crate::error::Result<Response> {
    let user_id = caller_id(&headers);
    let assessment = state
        .store
        .find_assessment(assessment_id, user_id)
        .await?
        .ok_or_else(|| Error::NotFound("Assessment not found".to_string()))?;

    let submission = state.score_submission(&assessment, payload.answers).await?;
    tracing::info!(
        submission_id = %submission.id,
        overall_score = submission.overall_score,
        "submission scored"
    );
    Ok(Json(json!({ "submission": submission })).into_response())
}

#[axum::debug_handler]
pub async fn list_for_assessment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(assessment_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let user_id = caller_id(&headers);
    let submissions = state
        .store
        .list_submissions(user_id, assessment_id)
        .await?;
    Ok(Json(json!({ "submissions": submissions })).into_response())
}

#[axum::debug_handler]
pub async fn get_submission(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let user_id = caller_id(&headers);
    let submission = state
        .store
        .find_submission(id, user_id)
        .await?
        .ok_or_else(|| Error::NotFound("Submission not found".to_string()))?;
    Ok(Json(json!({ "submission": submission })).into_response())
}
