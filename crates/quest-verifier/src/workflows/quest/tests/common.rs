use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::workflows::quest::domain::{
    CompletionKey, Condition, ConditionKind, ConditionOperator, EvaluationResult, QuestId,
    SubmissionRequest, UserId, UserProfile,
};
use crate::workflows::quest::ledger::{
    CompletionEntry, CompletionLedger, InMemoryCompletionLedger, LedgerError, Reservation,
};
use crate::workflows::quest::moderation::{
    KeywordModerator, ModerationError, ModerationService,
};
use crate::workflows::quest::service::QuestEvaluationService;

pub(super) const OWNED_ASSET: &str = "0xa11ce";

/// Scores 6: punctuation, palindrome "mmm", three capped joyful words.
pub(super) const HIGH_SCORING_TEXT: &str =
    "Aaa mmm Joyful Happy Vibrant Thrilled Euphoric Cheerful Delighted?";

pub(super) fn moderation_timeout() -> Duration {
    Duration::from_millis(200)
}

pub(super) fn claimed_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn submission(text: &str) -> SubmissionRequest {
    SubmissionRequest {
        quest_id: QuestId(Uuid::new_v4()),
        user_id: UserId(Uuid::new_v4()),
        claimed_at: claimed_at(),
        access_conditions: Vec::new(),
        user_profile: UserProfile {
            completed_quests: BTreeSet::new(),
            owned_assets: BTreeSet::from([OWNED_ASSET.to_string()]),
            level: 5,
        },
        submission_text: text.to_string(),
    }
}

pub(super) fn condition(kind: ConditionKind, operator: ConditionOperator, value: &str) -> Condition {
    Condition {
        kind,
        operator,
        value: value.to_string(),
    }
}

pub(super) fn with_conditions(text: &str, conditions: Vec<Condition>) -> SubmissionRequest {
    let mut request = submission(text);
    request.access_conditions = conditions;
    request
}

pub(super) type MemoryService = QuestEvaluationService<InMemoryCompletionLedger, KeywordModerator>;

pub(super) fn build_service() -> (MemoryService, Arc<InMemoryCompletionLedger>) {
    let ledger = Arc::new(InMemoryCompletionLedger::new());
    let service = QuestEvaluationService::new(
        ledger.clone(),
        Arc::new(KeywordModerator::default()),
        moderation_timeout(),
    );
    (service, ledger)
}

pub(super) fn service_with<M>(moderation: Arc<M>) -> (
    QuestEvaluationService<InMemoryCompletionLedger, M>,
    Arc<InMemoryCompletionLedger>,
)
where
    M: ModerationService + 'static,
{
    let ledger = Arc::new(InMemoryCompletionLedger::new());
    let service = QuestEvaluationService::new(ledger.clone(), moderation, moderation_timeout());
    (service, ledger)
}

/// Records how often moderation was consulted and returns a fixed verdict.
#[derive(Default)]
pub(super) struct CountingModerator {
    pub(super) flag: bool,
    calls: AtomicUsize,
}

impl CountingModerator {
    pub(super) fn flagging() -> Self {
        Self {
            flag: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModerationService for CountingModerator {
    async fn is_disallowed(&self, _text: &str) -> Result<bool, ModerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.flag)
    }
}

pub(super) struct FailingModerator;

#[async_trait]
impl ModerationService for FailingModerator {
    async fn is_disallowed(&self, _text: &str) -> Result<bool, ModerationError> {
        Err(ModerationError::Unavailable("provider offline".to_string()))
    }
}

pub(super) struct StalledModerator;

#[async_trait]
impl ModerationService for StalledModerator {
    async fn is_disallowed(&self, _text: &str) -> Result<bool, ModerationError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(false)
    }
}

pub(super) struct UnavailableLedger;

#[async_trait]
impl CompletionLedger for UnavailableLedger {
    async fn lookup(&self, _key: &CompletionKey) -> Result<Option<CompletionEntry>, LedgerError> {
        Err(LedgerError::Unavailable("database offline".to_string()))
    }

    async fn reserve(&self, _key: &CompletionKey) -> Result<Reservation, LedgerError> {
        Err(LedgerError::Unavailable("database offline".to_string()))
    }

    async fn complete(
        &self,
        _key: &CompletionKey,
        _result: EvaluationResult,
    ) -> Result<(), LedgerError> {
        Err(LedgerError::Unavailable("database offline".to_string()))
    }

    async fn release(&self, _key: &CompletionKey) -> Result<(), LedgerError> {
        Err(LedgerError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
