use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::dto::assessment_dto::GenerateAssessmentPayload;
use crate::error::Error;
use crate::routes::caller_id;
use crate::services::blueprint_service::BlueprintInput;
use crate::AppState;

#[axum::debug_handler]
pub async fn generate_assessment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<GenerateAssessmentPayload>,
) -> crate::error::Result<Response> {
    payload.validate()?;
    let user_id = caller_id(&headers);

    let input = BlueprintInput {
        role: payload.role,
        tech_stack: payload.tech_stack.into_vec(),
        experience_level: payload.experience_level,
        preferred_question_types: payload.preferred_question_types,
        duration_minutes: payload.duration_minutes,
        notes: payload.notes,
    };

    let assessment = state.generate_assessment(user_id, input).await?;
    tracing::info!(
        assessment_id = %assessment.id,
        questions = assessment.questions.len(),
        "assessment generated"
    );
    Ok(Json(json!({ "assessment": assessment })).into_response())
}

#[axum::debug_handler]
pub async fn list_assessments(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> crate::error::Result<Response> {
    let user_id = caller_id(&headers);
    let assessments = state.store.list_assessments(user_id).await?;
    Ok(Json(json!({ "assessments": assessments })).into_response())
}

#[axum::debug_handler]
pub async fn get_assessment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let user_id = caller_id(&headers);
    let assessment = state
        .store
        .find_assessment(id, user_id)
        .await?
        .ok_or_else(|| Error::NotFound("Assessment not found".to_string()))?;
    Ok(Json(json!({ "assessment": assessment })).into_response())
}
