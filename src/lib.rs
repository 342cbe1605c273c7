pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use uuid::Uuid;

use crate::config::Config;
use crate::error::Result;
use crate::models::assessment::Assessment;
use crate::models::submission::{Answer, Submission};
use crate::services::blueprint_service::{build_blueprint, BlueprintInput};
use crate::services::eval_service::{GeneratorEvaluator, OpenAnswerEvaluator};
use crate::services::generation_service::GenerationService;
use crate::services::insight_service::{practice_recommendations, study_resources, InsightService};
use crate::services::provider::{OpenAiGenerator, TextGenerator};
use crate::services::sandbox::SandboxRunner;
use crate::services::scoring_service::ScoringService;
use crate::services::storage::{MemoryStore, Storage};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Storage>,
    pub generation_service: GenerationService,
    pub scoring_service: ScoringService,
    pub insight_service: InsightService,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap();

        // No API key means no generator, which switches every
        // provider-backed step to its deterministic fallback.
        let generator: Option<Arc<dyn TextGenerator>> = config
            .openai_api_key
            .clone()
            .map(|key| Arc::new(OpenAiGenerator::new(key, http_client)) as Arc<dyn TextGenerator>);

        Self::with_collaborators(config, Arc::new(MemoryStore::new()), generator)
    }

    /// Builds the state around injected collaborators; tests substitute a
    /// stub generator or a pre-seeded store here.
    pub fn with_collaborators(
        config: Config,
        store: Arc<dyn Storage>,
        generator: Option<Arc<dyn TextGenerator>>,
    ) -> Self {
        let sandbox = SandboxRunner::new(Duration::from_millis(config.sandbox_timeout_ms));
        let evaluator: Arc<dyn OpenAnswerEvaluator> =
            Arc::new(GeneratorEvaluator::new(generator.clone()));

        let generation_service = GenerationService::new(generator.clone(), config.max_questions);
        let scoring_service = ScoringService::new(sandbox, evaluator);
        let insight_service = InsightService::new(generator);

        Self {
            config,
            store,
            generation_service,
            scoring_service,
            insight_service,
        }
    }

    /// Blueprint validation, question synthesis, and persistence in one
    /// step. Fails on invalid input or an empty generated set; provider
    /// trouble degrades to the baseline generator instead of failing.
    pub async fn generate_assessment(
        &self,
        user_id: Uuid,
        input: BlueprintInput,
    ) -> Result<Assessment> {
        let blueprint = build_blueprint(input)?;
        let questions = self.generation_service.generate(&blueprint).await?;
        let assessment = Assessment::from_blueprint(user_id, blueprint, questions);
        self.store.create_assessment(assessment).await
    }

    /// Scores the answers, synthesizes insight prose, and persists the
    /// submission. Grading itself never fails; every provider-dependent
    /// step has a deterministic fallback.
    pub async fn score_submission(
        &self,
        assessment: &Assessment,
        answers: Vec<Answer>,
    ) -> Result<Submission> {
        let scored = self.scoring_service.score(assessment, &answers).await;
        let insight = self
            .insight_service
            .synthesize(
                &assessment.questions,
                &answers,
                scored.overall_score,
                &scored.per_skill_breakdown,
            )
            .await;

        let submission = Submission {
            id: Uuid::new_v4(),
            assessment_id: assessment.id,
            user_id: assessment.user_id,
            answers,
            overall_score: scored.overall_score,
            per_skill_breakdown: scored.per_skill_breakdown,
            recommendations: practice_recommendations(&scored.weaknesses),
            suggested_resources: study_resources(&scored.weaknesses),
            strengths: scored.strengths,
            weaknesses: scored.weaknesses,
            ai_summary: insight.summary,
            question_feedbacks: insight.per_question_feedback,
            completed_at: Utc::now(),
        };
        self.store.create_submission(submission).await
    }
}
