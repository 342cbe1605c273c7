use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::{json, Value as JsonValue};

use crate::error::{Error, Result};
use crate::models::blueprint::Blueprint;
use crate::models::question::{
    Difficulty, Question, QuestionBody, QuestionMetadata, QuestionType, TestCase,
    ALL_QUESTION_TYPES,
};
use crate::services::normalizer::normalize;
use crate::services::provider::{Sourced, TextGenerator};

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```json\s*(.*?)```").unwrap());

/// Turns a blueprint into a finalized question set. Provider-backed when a
/// generator is configured, otherwise (or on any provider/parse failure)
/// the deterministic baseline templates.
#[derive(Clone)]
pub struct GenerationService {
    generator: Option<Arc<dyn TextGenerator>>,
    max_questions: usize,
}

impl GenerationService {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, max_questions: usize) -> Self {
        Self {
            generator,
            max_questions,
        }
    }

    /// The service-boundary entry point: synthesized questions capped to the
    /// configured maximum, with an empty result surfaced as a hard failure.
    pub async fn generate(&self, blueprint: &Blueprint) -> Result<Vec<Question>> {
        let mut questions = self.synthesize(blueprint).await.into_inner();
        if questions.len() > self.max_questions {
            questions.truncate(self.max_questions);
        }
        if questions.is_empty() {
            return Err(Error::GenerationEmpty);
        }
        Ok(questions)
    }

    pub async fn synthesize(&self, blueprint: &Blueprint) -> Sourced<Vec<Question>> {
        let parsed = match &self.generator {
            None => None,
            Some(generator) => {
                let prompt = build_prompt(blueprint);
                match generator.generate(&prompt).await {
                    Ok(text) => parse_candidates(&text, blueprint),
                    Err(e) => {
                        tracing::error!("Question generation failed: {:?}", e);
                        None
                    }
                }
            }
        };
        Sourced::or_fallback(parsed, || baseline_questions(blueprint))
    }
}

fn build_prompt(blueprint: &Blueprint) -> String {
    let count = std::cmp::max(5, blueprint.duration_minutes.div_ceil(10));
    let types: Vec<&str> = allowed_types(blueprint).iter().map(|t| t.as_str()).collect();
    let types = types.join(", ");

    let mut prompt = format!(
        "Generate {count} assessment questions for role {role}.\n\
         Tech stack: {stack}. Experience: {level}. Preferred types: {types}.\n\
         Notes: {notes}.\n",
        count = count,
        role = blueprint.role,
        stack = blueprint.tech_stack.join(", "),
        level = blueprint.experience_level,
        types = types,
        notes = blueprint.notes.as_deref().filter(|n| !n.is_empty()).unwrap_or("none"),
    );

    let constraints = &blueprint.parsed_constraints;
    if constraints.emphasize_problem_solving {
        prompt.push_str("Make the set heavier on problem solving.\n");
    }
    if constraints.emphasize_system_design {
        prompt.push_str("Include at least one system design question.\n");
    }
    if !constraints.focus_skills.is_empty() {
        prompt.push_str(&format!(
            "Focus especially on: {}.\n",
            constraints.focus_skills.join(", ")
        ));
    }

    prompt.push_str(&format!(
        "Return JSON array ONLY, with fields: questionId, type in [{types}], prompt, \
         options (mcq), correctAnswers (mcq/short), starterCode (coding), \
         tests (coding: array of {{name,input,expected,functionName?}}), \
         metadata {{skillTag,difficulty in [easy, medium, hard], timeEstimateMin}}. \
         Do not include labels like A) in options. Do not include descriptions outside JSON."
    ));
    prompt
}

/// Three parse strategies, in order: the whole response is a JSON array, a
/// fenced ```json block contains one, the slice between the first `[` and
/// the last `]` parses as one.
pub(crate) fn extract_json_array(text: &str) -> Option<Vec<JsonValue>> {
    if let Ok(JsonValue::Array(items)) = serde_json::from_str(text) {
        return Some(items);
    }
    if let Some(captures) = FENCED_JSON.captures(text) {
        if let Ok(JsonValue::Array(items)) = serde_json::from_str(captures[1].trim()) {
            return Some(items);
        }
    }
    if let (Some(first), Some(last)) = (text.find('['), text.rfind(']')) {
        if last > first {
            if let Ok(JsonValue::Array(items)) = serde_json::from_str(&text[first..=last]) {
                return Some(items);
            }
        }
    }
    None
}

/// Filters provider candidates to the allowed types and normalizes each.
/// `None` when nothing usable remains, so the caller falls back.
fn parse_candidates(text: &str, blueprint: &Blueprint) -> Option<Vec<Question>> {
    let raw = extract_json_array(text)?;
    let allowed = allowed_types(blueprint);
    let fallback_skill = blueprint.primary_skill();

    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut questions = Vec::new();
    for (i, candidate) in raw
        .iter()
        .filter(|c| {
            let kind = c
                .get("type")
                .and_then(JsonValue::as_str)
                .and_then(QuestionType::parse)
                .unwrap_or(QuestionType::Mcq);
            allowed.contains(&kind)
        })
        .enumerate()
    {
        let mut question = normalize(candidate, i, fallback_skill);
        let base = question.question_id.clone();
        let mut suffix = i + 1;
        while !seen_ids.insert(question.question_id.clone()) {
            question.question_id = format!("{}-{}", base, suffix);
            suffix += 1;
        }
        questions.push(question);
    }

    if questions.is_empty() {
        None
    } else {
        Some(questions)
    }
}

fn allowed_types(blueprint: &Blueprint) -> &[QuestionType] {
    if blueprint.preferred_question_types.is_empty() {
        &ALL_QUESTION_TYPES
    } else {
        &blueprint.preferred_question_types
    }
}

/// Deterministic built-in question set: `max(4, ceil(duration/10))`
/// questions cycling through the allowed types round-robin.
pub(crate) fn baseline_questions(blueprint: &Blueprint) -> Vec<Question> {
    let main_skill = blueprint.primary_skill();
    let allowed = allowed_types(blueprint);
    let count = std::cmp::max(4, blueprint.duration_minutes.div_ceil(10) as usize);

    (0..count)
        .map(|i| template_question(allowed[i % allowed.len()], i + 1, &blueprint.role, main_skill))
        .collect()
}

fn template_question(kind: QuestionType, index: usize, role: &str, main_skill: &str) -> Question {
    match kind {
        QuestionType::Mcq => Question {
            question_id: format!("q-mcq-{index}"),
            prompt: format!("Which statement about {main_skill} is true?"),
            metadata: QuestionMetadata {
                skill_tag: main_skill.to_string(),
                difficulty: Difficulty::Easy,
                time_estimate_min: 2,
            },
            body: QuestionBody::Mcq {
                options: vec![
                    "Hooks let you use state".to_string(),
                    "CSS in JS is mandatory".to_string(),
                    "React requires classes only".to_string(),
                    "JSX is plain HTML".to_string(),
                ],
                correct_answers: vec!["Hooks let you use state".to_string()],
            },
        },
        QuestionType::Short => Question {
            question_id: format!("q-short-{index}"),
            prompt: format!("Briefly explain a core concept in {role}."),
            metadata: QuestionMetadata {
                skill_tag: main_skill.to_string(),
                difficulty: Difficulty::Medium,
                time_estimate_min: 3,
            },
            body: QuestionBody::Short {
                correct_answers: vec![String::new()],
            },
        },
        QuestionType::Coding => Question {
            question_id: format!("q-coding-{index}"),
            prompt: "Implement a function add(a,b) that returns a + b.".to_string(),
            metadata: QuestionMetadata {
                skill_tag: "javascript".to_string(),
                difficulty: Difficulty::Easy,
                time_estimate_min: 5,
            },
            body: QuestionBody::Coding {
                starter_code: "function add(a, b) {\n  // TODO\n}\n".to_string(),
                tests: vec![
                    TestCase {
                        name: "2+3".to_string(),
                        input: Some(json!([2, 3])),
                        expected: json!(5),
                        function_name: Some("add".to_string()),
                        call: None,
                    },
                    TestCase {
                        name: "0+0".to_string(),
                        input: Some(json!([0, 0])),
                        expected: json!(0),
                        function_name: Some("add".to_string()),
                        call: None,
                    },
                ],
            },
        },
        QuestionType::Scenario => Question {
            question_id: format!("q-scenario-{index}"),
            prompt: format!(
                "You are designing a feature related to {main_skill}. Describe your approach and trade-offs."
            ),
            metadata: QuestionMetadata {
                skill_tag: main_skill.to_string(),
                difficulty: Difficulty::Medium,
                time_estimate_min: 7,
            },
            body: QuestionBody::Scenario {
                correct_answers: vec![String::new()],
            },
        },
    }
}
