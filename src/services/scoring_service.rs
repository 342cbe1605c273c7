use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::models::assessment::Assessment;
use crate::models::question::{Question, QuestionBody};
use crate::models::submission::{Answer, ScoredResult, SkillScore};
use crate::services::eval_service::OpenAnswerEvaluator;
use crate::services::sandbox::SandboxRunner;

const STRENGTH_THRESHOLD: f64 = 0.75;
const WEAKNESS_THRESHOLD: f64 = 0.5;

/// Weighted heterogeneous grading. Exact matching is pure; coding and
/// scenario questions delegate to the sandbox and the open-answer
/// evaluator, both of which recover from their own failures, so scoring
/// itself never fails.
#[derive(Clone)]
pub struct ScoringService {
    sandbox: SandboxRunner,
    evaluator: Arc<dyn OpenAnswerEvaluator>,
}

impl ScoringService {
    pub fn new(sandbox: SandboxRunner, evaluator: Arc<dyn OpenAnswerEvaluator>) -> Self {
        Self { sandbox, evaluator }
    }

    pub async fn score(&self, assessment: &Assessment, answers: &[Answer]) -> ScoredResult {
        let mut total_weight = 0.0;
        let mut total_score = 0.0;
        // (skill, score sum, weight sum), insertion-ordered by first sight.
        let mut per_skill: Vec<(String, f64, f64)> = Vec::new();

        for question in &assessment.questions {
            let weight = f64::from(question.metadata.time_estimate_min.max(1));
            total_weight += weight;

            // An unanswered question is penalized: its weight counts toward
            // the overall denominator, but it does not dilute its skill's
            // breakdown entry.
            let Some(answer) = answers
                .iter()
                .find(|a| a.question_id == question.question_id)
            else {
                continue;
            };

            let score = self.grade(question, answer).await;
            total_score += score * weight;

            let skill = if question.metadata.skill_tag.is_empty() {
                "general"
            } else {
                question.metadata.skill_tag.as_str()
            };
            match per_skill.iter_mut().find(|(s, _, _)| s == skill) {
                Some((_, score_sum, weight_sum)) => {
                    *score_sum += score * weight;
                    *weight_sum += weight;
                }
                None => per_skill.push((skill.to_string(), score * weight, weight)),
            }
        }

        let overall_score = if total_weight > 0.0 {
            round2(total_score / total_weight)
        } else {
            0.0
        };

        let per_skill_breakdown: Vec<SkillScore> = per_skill
            .into_iter()
            .map(|(skill, score_sum, weight_sum)| SkillScore {
                skill,
                score: round2(score_sum / weight_sum),
            })
            .collect();

        let strengths = per_skill_breakdown
            .iter()
            .filter(|s| s.score >= STRENGTH_THRESHOLD)
            .map(|s| s.skill.clone())
            .collect();
        let weaknesses = per_skill_breakdown
            .iter()
            .filter(|s| s.score < WEAKNESS_THRESHOLD)
            .map(|s| s.skill.clone())
            .collect();

        ScoredResult {
            overall_score,
            per_skill_breakdown,
            strengths,
            weaknesses,
        }
    }

    async fn grade(&self, question: &Question, answer: &Answer) -> f64 {
        match &question.body {
            QuestionBody::Mcq { correct_answers, .. }
            | QuestionBody::Short { correct_answers } => {
                exact_match_score(correct_answers, &answer.response)
            }
            QuestionBody::Coding { tests, .. } => {
                if tests.is_empty() {
                    return 0.0;
                }
                let sandbox = self.sandbox.clone();
                let code = response_text(&answer.response);
                let tests = tests.clone();
                match tokio::task::spawn_blocking(move || sandbox.run(&code, &tests)).await {
                    Ok(report) if report.total > 0 => report.passed as f64 / report.total as f64,
                    Ok(_) => 0.0,
                    Err(e) => {
                        tracing::error!("sandbox task failed: {:?}", e);
                        0.0
                    }
                }
            }
            QuestionBody::Scenario { correct_answers } => {
                let evaluation = self
                    .evaluator
                    .evaluate(
                        &question.prompt,
                        &correct_answers.join("\n"),
                        &response_text(&answer.response),
                    )
                    .await;
                evaluation.score.clamp(0.0, 1.0)
            }
        }
    }
}

/// Case-insensitive, whitespace-trimmed exact match; 1 or 0, no partial
/// credit.
fn exact_match_score(correct_answers: &[String], response: &JsonValue) -> f64 {
    let given = response_text(response).trim().to_lowercase();
    let hit = correct_answers
        .iter()
        .any(|c| c.trim().to_lowercase() == given);
    if hit {
        1.0
    } else {
        0.0
    }
}

pub(crate) fn response_text(response: &JsonValue) -> String {
    match response {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
