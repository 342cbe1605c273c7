use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::models::blueprint::{Blueprint, ParsedConstraints};
use crate::models::question::{QuestionType, ALL_QUESTION_TYPES};

/// Raw request fields before validation. The DTO layer hands these over
/// after shape checks; semantic validation happens here.
#[derive(Debug, Clone)]
pub struct BlueprintInput {
    pub role: String,
    pub tech_stack: Vec<String>,
    pub experience_level: String,
    pub preferred_question_types: Vec<QuestionType>,
    pub duration_minutes: u32,
    pub notes: Option<String>,
}

static PROBLEM_SOLVING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"problem\s*solv(?:ing|e)").unwrap());
static SYSTEM_DESIGN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"system\s*design").unwrap());
// A comma is not part of the capture class, so it ends a focus clause;
// skills within one clause are space-separated.
static FOCUS_SKILLS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"focus on ([a-z0-9\-\+\.# ]+)").unwrap());

const MAX_FOCUS_SKILLS: usize = 5;

/// Mines soft constraints out of free-text notes. Pure; the flags only
/// steer prompt construction.
pub fn parse_notes(notes: Option<&str>) -> ParsedConstraints {
    let normalized = notes.unwrap_or("").to_lowercase();

    let mut focus_skills: Vec<String> = Vec::new();
    'outer: for captures in FOCUS_SKILLS.captures_iter(&normalized) {
        for token in captures[1].split([' ', ',']) {
            if token.is_empty() || focus_skills.iter().any(|s| s == token) {
                continue;
            }
            focus_skills.push(token.to_string());
            if focus_skills.len() == MAX_FOCUS_SKILLS {
                break 'outer;
            }
        }
    }

    ParsedConstraints {
        emphasize_problem_solving: PROBLEM_SOLVING.is_match(&normalized),
        emphasize_system_design: SYSTEM_DESIGN.is_match(&normalized),
        focus_skills,
    }
}

/// Validates the raw fields and assembles the immutable generation plan.
/// An empty preferred type set defaults to all four types.
pub fn build_blueprint(input: BlueprintInput) -> Result<Blueprint> {
    if input.role.trim().is_empty() {
        return Err(Error::BadRequest("role is required".to_string()));
    }
    if input.experience_level.trim().is_empty() {
        return Err(Error::BadRequest("experienceLevel is required".to_string()));
    }
    if input.duration_minutes == 0 {
        return Err(Error::BadRequest(
            "durationMinutes must be a positive integer".to_string(),
        ));
    }

    let tech_stack: Vec<String> = input
        .tech_stack
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let preferred_question_types = if input.preferred_question_types.is_empty() {
        ALL_QUESTION_TYPES.to_vec()
    } else {
        input.preferred_question_types
    };

    let parsed_constraints = parse_notes(input.notes.as_deref());

    Ok(Blueprint {
        role: input.role,
        tech_stack,
        experience_level: input.experience_level,
        preferred_question_types,
        duration_minutes: input.duration_minutes,
        notes: input.notes,
        parsed_constraints,
    })
}
