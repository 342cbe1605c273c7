use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::services::provider::{Sourced, TextGenerator};

/// Open-answer grading outcome. `score` is only meaningful in [0,1]; the
/// scoring engine clamps it regardless of the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenEvaluation {
    pub score: f64,
    pub feedback: String,
}

/// Grades a free-form scenario answer against the expected text. Never
/// fails: implementations degrade to a heuristic score on any provider
/// trouble.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OpenAnswerEvaluator: Send + Sync {
    async fn evaluate(&self, prompt: &str, expected: &str, candidate: &str) -> OpenEvaluation;
}

#[derive(Deserialize)]
struct WireEvaluation {
    score: f64,
    feedback: String,
}

/// Provider-backed evaluator with deterministic heuristics: 0.7 when no
/// provider is configured, 0.6 when the provider errors or returns
/// something that is not strict `{score, feedback}` JSON.
#[derive(Clone)]
pub struct GeneratorEvaluator {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl GeneratorEvaluator {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl OpenAnswerEvaluator for GeneratorEvaluator {
    async fn evaluate(&self, prompt: &str, expected: &str, candidate: &str) -> OpenEvaluation {
        let Some(generator) = &self.generator else {
            return OpenEvaluation {
                score: 0.7,
                feedback: "Heuristic score without AI key. Consider providing more specifics and examples."
                    .to_string(),
            };
        };

        let request = format!(
            "Evaluate the candidate answer against expected answer.\n\
             Prompt: {prompt}\n\
             Expected: {expected}\n\
             Answer: {candidate}\n\
             Return STRICT JSON {{score: number between 0 and 1, feedback: string}}"
        );

        let parsed = match generator.generate(&request).await {
            Ok(text) => serde_json::from_str::<WireEvaluation>(&text)
                .ok()
                .map(|wire| OpenEvaluation {
                    score: wire.score,
                    feedback: wire.feedback,
                }),
            Err(e) => {
                tracing::warn!("Open-answer evaluation failed: {:?}", e);
                None
            }
        };

        Sourced::or_fallback(parsed, || OpenEvaluation {
            score: 0.6,
            feedback: "Could not parse AI evaluation. Heuristic score applied.".to_string(),
        })
        .into_inner()
    }
}
