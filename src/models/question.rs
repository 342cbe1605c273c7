use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A single assessment question in its wire shape. The `type` tag plus the
/// per-type fields live in the flattened [`QuestionBody`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question_id: String,
    pub prompt: String,
    pub metadata: QuestionMetadata,
    #[serde(flatten)]
    pub body: QuestionBody,
}

impl Question {
    pub fn question_type(&self) -> QuestionType {
        match self.body {
            QuestionBody::Mcq { .. } => QuestionType::Mcq,
            QuestionBody::Short { .. } => QuestionType::Short,
            QuestionBody::Coding { .. } => QuestionType::Coding,
            QuestionBody::Scenario { .. } => QuestionType::Scenario,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Mcq,
    Short,
    Coding,
    Scenario,
}

pub const ALL_QUESTION_TYPES: [QuestionType; 4] = [
    QuestionType::Mcq,
    QuestionType::Short,
    QuestionType::Coding,
    QuestionType::Scenario,
];

impl QuestionType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "mcq" => Some(Self::Mcq),
            "short" => Some(Self::Short),
            "coding" => Some(Self::Coding),
            "scenario" => Some(Self::Scenario),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mcq => "mcq",
            Self::Short => "short",
            Self::Coding => "coding",
            Self::Scenario => "scenario",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionMetadata {
    pub skill_tag: String,
    pub difficulty: Difficulty,
    pub time_estimate_min: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum QuestionBody {
    Mcq {
        options: Vec<String>,
        correct_answers: Vec<String>,
    },
    Short {
        correct_answers: Vec<String>,
    },
    Coding {
        starter_code: String,
        tests: Vec<TestCase>,
    },
    Scenario {
        correct_answers: Vec<String>,
    },
}

/// One coding test case. `call` takes precedence over `function_name` +
/// `input` when building the invocation; a case with neither is ungradable
/// and simply fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    #[serde(default = "default_test_name")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<JsonValue>,
    #[serde(default)]
    pub expected: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call: Option<String>,
}

fn default_test_name() -> String {
    "t".to_string()
}
