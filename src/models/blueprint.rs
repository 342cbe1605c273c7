use serde::{Deserialize, Serialize};

use crate::models::question::QuestionType;

/// Soft flags mined out of the free-text notes. They only steer prompt
/// construction; nothing downstream depends on them for correctness.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedConstraints {
    pub emphasize_problem_solving: bool,
    pub emphasize_system_design: bool,
    pub focus_skills: Vec<String>,
}

/// Validated generation plan. Every assessment echoes the blueprint it was
/// generated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
    pub role: String,
    pub tech_stack: Vec<String>,
    pub experience_level: String,
    pub preferred_question_types: Vec<QuestionType>,
    pub duration_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub parsed_constraints: ParsedConstraints,
}

impl Blueprint {
    /// The skill candidates are nominally being tested on; used for prompt
    /// text, fallback templates and metadata defaults.
    pub fn primary_skill(&self) -> &str {
        self.tech_stack
            .iter()
            .map(String::as_str)
            .find(|s| !s.trim().is_empty())
            .unwrap_or("general")
    }
}
