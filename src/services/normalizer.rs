use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value as JsonValue;

use crate::models::question::{
    Difficulty, Question, QuestionBody, QuestionMetadata, QuestionType, TestCase,
};

const PLACEHOLDER_OPTIONS: [&str; 4] = ["Option A", "Option B", "Option C", "Option D"];
const DEFAULT_PROMPT: &str = "Question";
const DEFAULT_TIME_ESTIMATE_MIN: u32 = 2;

static EDGE_QUOTES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^\\s*[\"'`\u{201C}\u{201D}\u{2018}\u{2019}]+|[\"'`\u{201C}\u{201D}\u{2018}\u{2019}]+\\s*$")
        .unwrap()
});
static LETTER_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[A-Za-z]\s*[).:\-]{1,2}\s*").unwrap());
static DIGIT_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\d+[).]\s*").unwrap());

/// Repairs one raw candidate into a structurally valid [`Question`].
/// Total: any JSON value comes out as a well-formed question. A candidate
/// with a missing or unknown `type` is treated as an MCQ. Running the
/// output back through yields the identical question.
pub fn normalize(raw: &JsonValue, position: usize, fallback_skill: &str) -> Question {
    let question_id = scalar_to_string(raw.get("questionId").unwrap_or(&JsonValue::Null))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("q-{}", position + 1));

    let prompt = raw
        .get("prompt")
        .and_then(JsonValue::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_PROMPT)
        .to_string();

    let metadata = normalize_metadata(raw.get("metadata"), fallback_skill);

    let kind = raw
        .get("type")
        .and_then(JsonValue::as_str)
        .and_then(QuestionType::parse)
        .unwrap_or(QuestionType::Mcq);

    let body = match kind {
        QuestionType::Mcq => normalize_mcq(raw),
        QuestionType::Short => QuestionBody::Short {
            correct_answers: normalize_open_answers(raw),
        },
        QuestionType::Scenario => QuestionBody::Scenario {
            correct_answers: normalize_open_answers(raw),
        },
        QuestionType::Coding => normalize_coding(raw),
    };

    Question {
        question_id,
        prompt,
        metadata,
        body,
    }
}

/// Strips surrounding quote characters and leading enumeration markers
/// ("A)", "a.", "1)", ...). Looped to a fixpoint so stacked markers come
/// off completely and re-sanitizing is a no-op.
pub(crate) fn sanitize_option(raw: &str) -> String {
    let mut current = raw.trim().to_string();
    loop {
        let mut next = EDGE_QUOTES.replace_all(&current, "").to_string();
        next = LETTER_MARKER.replace(&next, "").to_string();
        next = DIGIT_MARKER.replace(&next, "").to_string();
        let next = next.trim().to_string();
        if next == current {
            return next;
        }
        current = next;
    }
}

fn scalar_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn normalize_metadata(raw: Option<&JsonValue>, fallback_skill: &str) -> QuestionMetadata {
    let Some(map) = raw.and_then(JsonValue::as_object) else {
        return QuestionMetadata {
            skill_tag: fallback_skill.to_string(),
            difficulty: Difficulty::Easy,
            time_estimate_min: DEFAULT_TIME_ESTIMATE_MIN,
        };
    };

    QuestionMetadata {
        skill_tag: map
            .get("skillTag")
            .and_then(JsonValue::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .unwrap_or_else(|| fallback_skill.to_string()),
        difficulty: map
            .get("difficulty")
            .and_then(JsonValue::as_str)
            .and_then(Difficulty::parse)
            .unwrap_or(Difficulty::Easy),
        time_estimate_min: map
            .get("timeEstimateMin")
            .and_then(JsonValue::as_u64)
            .filter(|v| *v > 0)
            .map(|v| v as u32)
            .unwrap_or(DEFAULT_TIME_ESTIMATE_MIN),
    }
}

fn normalize_mcq(raw: &JsonValue) -> QuestionBody {
    let mut options: Vec<String> = raw
        .get("options")
        .and_then(JsonValue::as_array)
        .map(|items| items.iter().filter_map(scalar_to_string).collect())
        .unwrap_or_default();
    if options.len() < 2 {
        options = PLACEHOLDER_OPTIONS.iter().map(|s| s.to_string()).collect();
    }
    let options: Vec<String> = options.iter().map(|o| sanitize_option(o)).collect();

    let first_correct = raw
        .get("correctAnswers")
        .and_then(JsonValue::as_array)
        .and_then(|items| items.iter().filter_map(scalar_to_string).next());
    let correct = resolve_correct_answer(first_correct, &options);

    QuestionBody::Mcq {
        options,
        correct_answers: vec![correct],
    }
}

/// Picks the single retained correct answer. Membership of the sanitized
/// token wins; a lone A-Z letter is a 0-based option index; everything
/// else lands on the first option.
fn resolve_correct_answer(first: Option<String>, options: &[String]) -> String {
    let fallback = options[0].clone();
    let Some(token) = first else {
        return fallback;
    };

    let sanitized = sanitize_option(&token);
    if options.iter().any(|o| *o == sanitized) {
        return sanitized;
    }

    let trimmed = token.trim();
    let mut chars = trimmed.chars();
    if let (Some(letter), None) = (chars.next(), chars.next()) {
        let upper = letter.to_ascii_uppercase();
        if upper.is_ascii_uppercase() {
            let index = (upper as usize) - ('A' as usize);
            if index < options.len() {
                return options[index].clone();
            }
        }
    }

    fallback
}

fn normalize_open_answers(raw: &JsonValue) -> Vec<String> {
    let answers: Vec<String> = raw
        .get("correctAnswers")
        .and_then(JsonValue::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();
    if answers.is_empty() {
        // Empty-string sentinel: no exact-match grading, defer to open evaluation.
        vec![String::new()]
    } else {
        answers
    }
}

fn normalize_coding(raw: &JsonValue) -> QuestionBody {
    let starter_code = raw
        .get("starterCode")
        .and_then(JsonValue::as_str)
        .unwrap_or("")
        .to_string();
    let tests = raw
        .get("tests")
        .and_then(JsonValue::as_array)
        .map(|items| items.iter().map(normalize_test).collect())
        .unwrap_or_default();

    QuestionBody::Coding {
        starter_code,
        tests,
    }
}

fn normalize_test(raw: &JsonValue) -> TestCase {
    TestCase {
        name: raw
            .get("name")
            .and_then(JsonValue::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or("t")
            .to_string(),
        input: raw.get("input").filter(|v| !v.is_null()).cloned(),
        expected: raw.get("expected").cloned().unwrap_or(JsonValue::Null),
        function_name: raw
            .get("functionName")
            .and_then(JsonValue::as_str)
            .map(String::from),
        call: raw.get("call").and_then(JsonValue::as_str).map(String::from),
    }
}
