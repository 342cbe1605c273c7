use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    /// Free-shape candidate response: a string for mcq/short/scenario,
    /// source code for coding questions.
    pub response: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillScore {
    pub skill: String,
    pub score: f64,
}

/// Aggregated grading outcome. `per_skill_breakdown` keeps the order in
/// which skills were first encountered while walking the questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredResult {
    pub overall_score: f64,
    pub per_skill_breakdown: Vec<SkillScore>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionFeedback {
    pub question_id: String,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub assessment_id: Uuid,
    pub user_id: Uuid,
    pub answers: Vec<Answer>,
    pub overall_score: f64,
    pub per_skill_breakdown: Vec<SkillScore>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    pub suggested_resources: Vec<String>,
    pub ai_summary: String,
    pub question_feedbacks: Vec<QuestionFeedback>,
    pub completed_at: DateTime<Utc>,
}
