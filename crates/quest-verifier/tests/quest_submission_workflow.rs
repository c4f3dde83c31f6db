//! End-to-end scenarios for quest submission evaluation.
//!
//! Scenarios run through the public service facade and HTTP router so gating,
//! scoring, moderation, and single-attempt bookkeeping are validated together.

mod common {
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use quest_verifier::workflows::quest::{
        Condition, ConditionKind, ConditionOperator, InMemoryCompletionLedger, KeywordModerator,
        QuestEvaluationService, QuestId, SubmissionRequest, UserId, UserProfile,
    };

    pub(super) type Service = QuestEvaluationService<InMemoryCompletionLedger, KeywordModerator>;

    pub(super) fn service() -> (Arc<Service>, Arc<InMemoryCompletionLedger>) {
        let ledger = Arc::new(InMemoryCompletionLedger::new());
        let service = QuestEvaluationService::new(
            ledger.clone(),
            Arc::new(KeywordModerator::default()),
            Duration::from_secs(1),
        );
        (Arc::new(service), ledger)
    }

    pub(super) fn request(text: &str, level: u32, conditions: Vec<Condition>) -> SubmissionRequest {
        SubmissionRequest {
            quest_id: QuestId(Uuid::new_v4()),
            user_id: UserId(Uuid::new_v4()),
            claimed_at: Utc
                .with_ymd_and_hms(2024, 3, 1, 9, 30, 0)
                .single()
                .expect("valid timestamp"),
            access_conditions: conditions,
            user_profile: UserProfile {
                completed_quests: BTreeSet::new(),
                owned_assets: BTreeSet::from(["0x5eed".to_string()]),
                level,
            },
            submission_text: text.to_string(),
        }
    }

    pub(super) fn level_above(threshold: &str) -> Condition {
        Condition {
            kind: ConditionKind::Level,
            operator: ConditionOperator::GreaterThan,
            value: threshold.to_string(),
        }
    }
}

use common::*;
use quest_verifier::workflows::quest::{
    quest_router, EvaluationResult, QuestStatus, ScoringEngine,
};
use serde_json::{json, Value};
use tower::ServiceExt;

const MIXED_HEURISTICS_TEXT: &str = "Aaa mmm Joyful Happy Vibrant Thrilled Euphoric Cheerful Delighted?";

#[tokio::test]
async fn scenario_plain_text_fails_with_zero() {
    let (service, _) = service();

    let result = service
        .evaluate(&request("test", 1, Vec::new()))
        .await
        .expect("evaluation runs");

    assert_eq!(result, EvaluationResult::rejected());
}

#[tokio::test]
async fn scenario_mixed_heuristics_succeed_with_six() {
    let (service, _) = service();

    let result = service
        .evaluate(&request(MIXED_HEURISTICS_TEXT, 1, Vec::new()))
        .await
        .expect("evaluation runs");

    assert_eq!(
        result,
        EvaluationResult {
            status: QuestStatus::Success,
            score: 6,
        }
    );
    assert_eq!(ScoringEngine::new().score(MIXED_HEURISTICS_TEXT).total, 6);
}

#[tokio::test]
async fn scenario_level_gate_blocks_without_recording() {
    let (service, ledger) = service();
    let submission = request(MIXED_HEURISTICS_TEXT, 5, vec![level_above("10")]);

    let result = service.evaluate(&submission).await.expect("evaluation runs");

    assert_eq!(result, EvaluationResult::rejected());
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn scenario_second_submission_is_rejected() {
    let (service, ledger) = service();
    let submission = request(MIXED_HEURISTICS_TEXT, 12, vec![level_above("10")]);

    let first = service.evaluate(&submission).await.expect("first evaluation");
    let second = service.evaluate(&submission).await.expect("second evaluation");

    assert_eq!(first.status, QuestStatus::Success);
    assert_eq!(second, EvaluationResult::rejected());
    assert_eq!(ledger.len(), 1);
}

#[tokio::test]
async fn router_round_trip_records_completion() {
    let (service, _) = service();
    let router = quest_router(service);
    let submission = request(MIXED_HEURISTICS_TEXT, 3, Vec::new());
    let quest_id = submission.quest_id;
    let user_id = submission.user_id;

    let response = router
        .clone()
        .oneshot(
            axum::http::Request::post("/quest/submit")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::to_vec(&submission).expect("serialize submission"),
                ))
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    assert_eq!(
        read_json(response).await,
        json!({ "status": "success", "score": 6 })
    );

    let repeat = router
        .clone()
        .oneshot(
            axum::http::Request::post("/quest/submit")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::to_vec(&submission).expect("serialize submission"),
                ))
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(
        read_json(repeat).await,
        json!({ "status": "fail", "score": 0 })
    );

    let status = router
        .oneshot(
            axum::http::Request::get(format!("/quest/{quest_id}/users/{user_id}"))
                .body(axum::body::Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    let view = read_json(status).await;
    assert_eq!(view["state"], json!("completed"));
    assert_eq!(view["result"]["score"], json!(6));
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
