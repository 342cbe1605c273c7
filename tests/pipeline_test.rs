use serde_json::json;
use uuid::Uuid;

use assessment_backend::config::Config;
use assessment_backend::models::question::{QuestionBody, QuestionType};
use assessment_backend::models::submission::Answer;
use assessment_backend::services::blueprint_service::BlueprintInput;
use assessment_backend::AppState;

fn offline_state() -> AppState {
    AppState::new(Config::default())
}

fn backend_input() -> BlueprintInput {
    BlueprintInput {
        role: "Backend Developer".to_string(),
        tech_stack: vec!["node".to_string()],
        experience_level: "1-3 years".to_string(),
        preferred_question_types: vec![QuestionType::Mcq],
        duration_minutes: 20,
        notes: Some(String::new()),
    }
}

#[tokio::test]
async fn offline_generation_produces_four_valid_mcqs() {
    let state = offline_state();
    let user = Uuid::new_v4();

    let assessment = state
        .generate_assessment(user, backend_input())
        .await
        .expect("generate");

    // max(4, ceil(20/10)) = 4, all mcq
    assert_eq!(assessment.questions.len(), 4);
    for question in &assessment.questions {
        match &question.body {
            QuestionBody::Mcq {
                options,
                correct_answers,
            } => {
                assert_eq!(options.len(), 4);
                assert_eq!(correct_answers.len(), 1);
                assert!(options.contains(&correct_answers[0]));
            }
            other => panic!("expected mcq, got {:?}", other),
        }
    }

    // persisted and retrievable by the owner only
    assert!(state
        .store
        .find_assessment(assessment.id, user)
        .await
        .unwrap()
        .is_some());
    assert!(state
        .store
        .find_assessment(assessment.id, Uuid::new_v4())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn offline_generation_is_deterministic() {
    let state = offline_state();
    let user = Uuid::new_v4();

    let first = state
        .generate_assessment(user, backend_input())
        .await
        .unwrap();
    let second = state
        .generate_assessment(user, backend_input())
        .await
        .unwrap();

    assert_eq!(first.questions, second.questions);
}

#[tokio::test]
async fn rejects_invalid_blueprints() {
    let state = offline_state();
    let user = Uuid::new_v4();

    let mut missing_role = backend_input();
    missing_role.role = String::new();
    assert!(state.generate_assessment(user, missing_role).await.is_err());

    let mut zero_duration = backend_input();
    zero_duration.duration_minutes = 0;
    assert!(state
        .generate_assessment(user, zero_duration)
        .await
        .is_err());
}

#[tokio::test]
async fn unanswered_submission_scores_zero_with_full_insight() {
    let state = offline_state();
    let user = Uuid::new_v4();
    let assessment = state
        .generate_assessment(user, backend_input())
        .await
        .unwrap();

    let submission = state
        .score_submission(&assessment, vec![])
        .await
        .expect("score");

    assert_eq!(submission.overall_score, 0.0);
    assert!(!submission.ai_summary.is_empty());
    assert_eq!(
        submission.question_feedbacks.len(),
        assessment.questions.len()
    );
    for (feedback, question) in submission
        .question_feedbacks
        .iter()
        .zip(&assessment.questions)
    {
        assert_eq!(feedback.question_id, question.question_id);
    }
}

#[tokio::test]
async fn correct_answers_score_full_marks() {
    let state = offline_state();
    let user = Uuid::new_v4();
    let assessment = state
        .generate_assessment(user, backend_input())
        .await
        .unwrap();

    let answers: Vec<Answer> = assessment
        .questions
        .iter()
        .map(|q| {
            let QuestionBody::Mcq { correct_answers, .. } = &q.body else {
                panic!("expected mcq");
            };
            Answer {
                question_id: q.question_id.clone(),
                response: json!(correct_answers[0]),
            }
        })
        .collect();

    let submission = state
        .score_submission(&assessment, answers)
        .await
        .unwrap();

    assert_eq!(submission.overall_score, 1.0);
    assert!(submission.weaknesses.is_empty());
    assert!(submission.recommendations.is_empty());
    assert_eq!(submission.strengths, vec!["node".to_string()]);
}

#[tokio::test]
async fn coding_questions_run_through_the_sandbox_end_to_end() {
    let state = offline_state();
    let user = Uuid::new_v4();
    let mut input = backend_input();
    input.preferred_question_types = vec![QuestionType::Coding];
    input.duration_minutes = 10;

    let assessment = state.generate_assessment(user, input).await.unwrap();
    assert_eq!(assessment.questions.len(), 4);

    let answers: Vec<Answer> = assessment
        .questions
        .iter()
        .map(|q| Answer {
            question_id: q.question_id.clone(),
            response: json!("function add(a, b) { return a + b; }"),
        })
        .collect();

    let submission = state
        .score_submission(&assessment, answers)
        .await
        .unwrap();
    assert_eq!(submission.overall_score, 1.0);
}

#[tokio::test]
async fn retakes_accumulate_per_assessment() {
    let state = offline_state();
    let user = Uuid::new_v4();
    let assessment = state
        .generate_assessment(user, backend_input())
        .await
        .unwrap();

    state.score_submission(&assessment, vec![]).await.unwrap();
    state.score_submission(&assessment, vec![]).await.unwrap();

    let submissions = state
        .store
        .list_submissions(user, assessment.id)
        .await
        .unwrap();
    assert_eq!(submissions.len(), 2);
    assert!(submissions
        .iter()
        .all(|s| s.assessment_id == assessment.id));
}
