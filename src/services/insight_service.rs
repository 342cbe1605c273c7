use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::models::question::Question;
use crate::models::submission::{Answer, QuestionFeedback, SkillScore};
use crate::services::provider::{Sourced, TextGenerator};

/// Prose feedback for a scored submission: one summary plus one feedback
/// line per question.
#[derive(Debug, Clone, PartialEq)]
pub struct Insight {
    pub summary: String,
    pub per_question_feedback: Vec<QuestionFeedback>,
}

/// Provider-backed insight synthesis with deterministic fallbacks. Never
/// fails and always returns exactly one feedback entry per question on the
/// fallback paths.
#[derive(Clone)]
pub struct InsightService {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl InsightService {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    pub async fn synthesize(
        &self,
        questions: &[Question],
        answers: &[Answer],
        overall_score: f64,
        per_skill: &[SkillScore],
    ) -> Insight {
        let Some(generator) = &self.generator else {
            return offline_insight(questions, overall_score, per_skill);
        };

        let prompt = format!(
            "Create a comprehensive, multi-paragraph assessment summary and per-question feedback.\n\
             Questions (JSON): {questions}\n\
             Answers (JSON): {answers}\n\
             OverallScore: {overall_score}\n\
             PerSkill: {per_skill}\n\
             Return STRICT JSON {{summary: string, perQuestionFeedback: Array<{{questionId:string, feedback:string}}>}}.",
            questions = serde_json::to_string(questions).unwrap_or_default(),
            answers = serde_json::to_string(answers).unwrap_or_default(),
            per_skill = serde_json::to_string(per_skill).unwrap_or_default(),
        );

        let parsed = match generator.generate(&prompt).await {
            Ok(text) => parse_insight(&text),
            Err(e) => {
                tracing::warn!("Insight synthesis failed: {:?}", e);
                None
            }
        };

        Sourced::or_fallback(parsed, || degraded_insight(questions, overall_score)).into_inner()
    }
}

/// Strict shape check: a string `summary` and a `perQuestionFeedback` array
/// whose entries all carry string `questionId` and `feedback`.
fn parse_insight(text: &str) -> Option<Insight> {
    let value: JsonValue = serde_json::from_str(text).ok()?;
    let summary = value.get("summary")?.as_str()?.to_string();
    let entries = value.get("perQuestionFeedback")?.as_array()?;

    let mut per_question_feedback = Vec::with_capacity(entries.len());
    for entry in entries {
        per_question_feedback.push(QuestionFeedback {
            question_id: entry.get("questionId")?.as_str()?.to_string(),
            feedback: entry.get("feedback")?.as_str()?.to_string(),
        });
    }

    Some(Insight {
        summary,
        per_question_feedback,
    })
}

/// Fallback when no provider is configured.
fn offline_insight(questions: &[Question], overall_score: f64, per_skill: &[SkillScore]) -> Insight {
    let summary = format!(
        "Overall, you demonstrated competency across {} skill areas.\n\n\
         Your overall score was {:.0}%. Focus on weaker areas to improve.",
        per_skill.len(),
        overall_score * 100.0
    );
    let per_question_feedback = questions
        .iter()
        .map(|q| QuestionFeedback {
            question_id: q.question_id.clone(),
            feedback: format!(
                "For {} question, aim to be more precise and cover edge cases.",
                q.question_type().as_str()
            ),
        })
        .collect();

    Insight {
        summary,
        per_question_feedback,
    }
}

/// Fallback when the provider responded but not with usable JSON.
fn degraded_insight(questions: &[Question], overall_score: f64) -> Insight {
    Insight {
        summary: format!(
            "Overall score {:.0}%. See per-skill for details.",
            overall_score * 100.0
        ),
        per_question_feedback: questions
            .iter()
            .map(|q| QuestionFeedback {
                question_id: q.question_id.clone(),
                feedback: "Consider improving depth and clarity.".to_string(),
            })
            .collect(),
    }
}

pub fn practice_recommendations(weaknesses: &[String]) -> Vec<String> {
    weaknesses
        .iter()
        .map(|w| format!("Practice more advanced {w} topics."))
        .collect()
}

pub fn study_resources(weaknesses: &[String]) -> Vec<String> {
    weaknesses
        .iter()
        .map(|w| format!("Read official docs and take a tutorial on {w}."))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{Difficulty, QuestionBody, QuestionMetadata};
    use crate::services::provider::MockTextGenerator;

    fn questions() -> Vec<Question> {
        vec![
            Question {
                question_id: "q-1".to_string(),
                prompt: "Pick".to_string(),
                metadata: QuestionMetadata {
                    skill_tag: "js".to_string(),
                    difficulty: Difficulty::Easy,
                    time_estimate_min: 2,
                },
                body: QuestionBody::Mcq {
                    options: vec!["a".to_string(), "b".to_string()],
                    correct_answers: vec!["a".to_string()],
                },
            },
            Question {
                question_id: "q-2".to_string(),
                prompt: "Explain".to_string(),
                metadata: QuestionMetadata {
                    skill_tag: "js".to_string(),
                    difficulty: Difficulty::Medium,
                    time_estimate_min: 3,
                },
                body: QuestionBody::Short {
                    correct_answers: vec!["closure".to_string()],
                },
            },
        ]
    }

    fn skills() -> Vec<SkillScore> {
        vec![SkillScore {
            skill: "js".to_string(),
            score: 0.5,
        }]
    }

    #[tokio::test]
    async fn offline_fallback_covers_every_question() {
        let service = InsightService::new(None);
        let insight = service.synthesize(&questions(), &[], 0.5, &skills()).await;

        assert!(insight.summary.contains("50%"));
        assert!(insight.summary.contains("1 skill areas"));
        assert_eq!(insight.per_question_feedback.len(), 2);
        assert_eq!(insight.per_question_feedback[0].question_id, "q-1");
        assert!(insight.per_question_feedback[0].feedback.contains("mcq"));
        assert_eq!(insight.per_question_feedback[1].question_id, "q-2");
        assert!(insight.per_question_feedback[1].feedback.contains("short"));
    }

    #[tokio::test]
    async fn provider_insight_is_used_when_well_formed() {
        let mut generator = MockTextGenerator::new();
        generator.expect_generate().returning(|_| {
            Ok(r#"{
                "summary": "Strong showing.",
                "perQuestionFeedback": [
                    {"questionId": "q-1", "feedback": "Good pick."},
                    {"questionId": "q-2", "feedback": "More depth."}
                ]
            }"#
            .to_string())
        });
        let service = InsightService::new(Some(Arc::new(generator)));

        let insight = service.synthesize(&questions(), &[], 0.9, &skills()).await;
        assert_eq!(insight.summary, "Strong showing.");
        assert_eq!(insight.per_question_feedback.len(), 2);
        assert_eq!(insight.per_question_feedback[1].feedback, "More depth.");
    }

    #[tokio::test]
    async fn malformed_provider_response_degrades() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Ok("great work everyone".to_string()));
        let service = InsightService::new(Some(Arc::new(generator)));

        let insight = service.synthesize(&questions(), &[], 0.25, &skills()).await;
        assert!(insight.summary.contains("25%"));
        assert_eq!(insight.per_question_feedback.len(), 2);
        assert_eq!(
            insight.per_question_feedback[0].feedback,
            "Consider improving depth and clarity."
        );
    }

    #[tokio::test]
    async fn missing_fields_in_provider_response_degrade() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Ok(r#"{"summary": "no feedback array"}"#.to_string()));
        let service = InsightService::new(Some(Arc::new(generator)));

        let insight = service.synthesize(&questions(), &[], 0.0, &skills()).await;
        assert!(insight.summary.contains("0%"));
    }

    #[test]
    fn weakness_templates() {
        let weaknesses = vec!["sql".to_string(), "css".to_string()];
        assert_eq!(
            practice_recommendations(&weaknesses),
            vec![
                "Practice more advanced sql topics.",
                "Practice more advanced css topics."
            ]
        );
        assert_eq!(
            study_resources(&weaknesses)[0],
            "Read official docs and take a tutorial on sql."
        );
    }
}
