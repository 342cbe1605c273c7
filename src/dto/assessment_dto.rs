use serde::Deserialize;
use validator::Validate;

use crate::models::question::QuestionType;
use crate::models::submission::Answer;

/// The tech stack may arrive as a proper array or as a comma-separated
/// string; both normalize to the same list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TechStackInput {
    List(Vec<String>),
    Csv(String),
}

impl Default for TechStackInput {
    fn default() -> Self {
        TechStackInput::List(Vec::new())
    }
}

impl TechStackInput {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            TechStackInput::List(items) => items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            TechStackInput::Csv(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAssessmentPayload {
    #[validate(length(min = 1, message = "role is required"))]
    pub role: String,

    #[serde(default)]
    pub tech_stack: TechStackInput,

    #[validate(length(min = 1, message = "experienceLevel is required"))]
    pub experience_level: String,

    #[serde(default)]
    pub preferred_question_types: Vec<QuestionType>,

    #[validate(range(min = 1, message = "durationMinutes must be at least 1"))]
    pub duration_minutes: u32,

    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswersPayload {
    pub answers: Vec<Answer>,
}
