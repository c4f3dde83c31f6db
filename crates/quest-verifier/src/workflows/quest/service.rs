use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::conditions::AccessCondition;
use super::domain::{
    CompletionKey, Condition, EvaluationResult, QuestId, QuestStatus, SubmissionRequest, UserId,
};
use super::ledger::{CompletionLedger, CompletionView, LedgerError, Reservation};
use super::moderation::{ModerationError, ModerationService};
use super::scoring::{ScoreBreakdown, ScoringEngine};

/// Minimum score for a submission to count as a successful completion.
pub const PASS_THRESHOLD: u32 = 5;

/// Service composing condition gating, scoring, moderation, and the completion ledger.
pub struct QuestEvaluationService<L, M> {
    ledger: Arc<L>,
    moderation: Arc<M>,
    engine: ScoringEngine,
    moderation_timeout: Duration,
}

impl<L, M> QuestEvaluationService<L, M>
where
    L: CompletionLedger + 'static,
    M: ModerationService + 'static,
{
    pub fn new(ledger: Arc<L>, moderation: Arc<M>, moderation_timeout: Duration) -> Self {
        Self {
            ledger,
            moderation,
            engine: ScoringEngine::new(),
            moderation_timeout,
        }
    }

    /// Evaluate a submission, consuming the user's single scored attempt once
    /// every access condition passes.
    pub async fn evaluate(
        &self,
        request: &SubmissionRequest,
    ) -> Result<EvaluationResult, QuestServiceError> {
        self.evaluate_with_breakdown(request)
            .await
            .map(|report| report.result)
    }

    /// Same pipeline as [`Self::evaluate`], also returning the heuristic
    /// breakdown when the submission reached scoring.
    pub async fn evaluate_with_breakdown(
        &self,
        request: &SubmissionRequest,
    ) -> Result<EvaluationReport, QuestServiceError> {
        let key = request.completion_key();

        if self.ledger.lookup(&key).await?.is_some() {
            info!(
                quest_id = %request.quest_id,
                user_id = %request.user_id,
                "quest already completed by user"
            );
            return Ok(EvaluationReport::rejected());
        }

        for condition in &request.access_conditions {
            if !condition_passes(request, condition) {
                return Ok(EvaluationReport::rejected());
            }
        }

        if self.ledger.reserve(&key).await? == Reservation::AlreadyConsumed {
            info!(
                quest_id = %request.quest_id,
                user_id = %request.user_id,
                "attempt consumed by a concurrent submission"
            );
            return Ok(EvaluationReport::rejected());
        }
        let mut guard = ReservationGuard::new(self.ledger.clone(), key);

        let breakdown = self.engine.score(&request.submission_text);

        let flagged = match self.moderate(&request.submission_text).await {
            Ok(flagged) => flagged,
            Err(err) => {
                self.release(&key).await;
                guard.disarm();
                return Err(err.into());
            }
        };

        let score = if flagged {
            debug!(
                quest_id = %request.quest_id,
                user_id = %request.user_id,
                heuristic_score = breakdown.total,
                "submission vetoed by moderation"
            );
            0
        } else {
            breakdown.total
        };

        let status = if score >= PASS_THRESHOLD {
            QuestStatus::Success
        } else {
            QuestStatus::Fail
        };
        let result = EvaluationResult { status, score };

        let recorded = self.ledger.complete(&key, result).await;
        guard.disarm();
        recorded?;
        info!(
            quest_id = %request.quest_id,
            user_id = %request.user_id,
            score,
            status = status.label(),
            "quest attempt recorded"
        );

        Ok(EvaluationReport {
            result,
            breakdown: Some(breakdown),
        })
    }

    /// Current ledger state for a (quest, user) pair.
    pub async fn completion(
        &self,
        quest_id: QuestId,
        user_id: UserId,
    ) -> Result<CompletionView, QuestServiceError> {
        let key = CompletionKey::new(quest_id, user_id);
        let entry = self.ledger.lookup(&key).await?;
        Ok(CompletionView::new(key, entry))
    }

    async fn moderate(&self, text: &str) -> Result<bool, ModerationError> {
        tokio::time::timeout(self.moderation_timeout, self.moderation.is_disallowed(text))
            .await
            .map_err(|_| ModerationError::Timeout(self.moderation_timeout))?
    }

    async fn release(&self, key: &CompletionKey) {
        if let Err(err) = self.ledger.release(key).await {
            warn!(key = %key, error = %err, "failed to release aborted reservation");
        }
    }
}

/// Outcome of an evaluation together with how the score was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationReport {
    pub result: EvaluationResult,
    /// `None` when the submission never reached scoring.
    pub breakdown: Option<ScoreBreakdown>,
}

impl EvaluationReport {
    fn rejected() -> Self {
        Self {
            result: EvaluationResult::rejected(),
            breakdown: None,
        }
    }
}

/// Releases a held reservation if the evaluation is dropped before it records
/// a result, e.g. on client disconnect or an outer timeout.
struct ReservationGuard<L: CompletionLedger + 'static> {
    ledger: Arc<L>,
    key: CompletionKey,
    armed: bool,
}

impl<L: CompletionLedger + 'static> ReservationGuard<L> {
    fn new(ledger: Arc<L>, key: CompletionKey) -> Self {
        Self {
            ledger,
            key,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<L: CompletionLedger + 'static> Drop for ReservationGuard<L> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let ledger = self.ledger.clone();
        let key = self.key;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = ledger.release(&key).await {
                        warn!(key = %key, error = %err, "failed to release cancelled reservation");
                    } else {
                        debug!(key = %key, "released reservation of cancelled evaluation");
                    }
                });
            }
            Err(_) => warn!(key = %key, "no runtime to release cancelled reservation"),
        }
    }
}

fn condition_passes(request: &SubmissionRequest, condition: &Condition) -> bool {
    match AccessCondition::parse(condition) {
        Ok(gate) => gate.is_satisfied(request),
        Err(err) => {
            warn!(
                quest_id = %request.quest_id,
                user_id = %request.user_id,
                error = %err,
                "access condition rejected"
            );
            false
        }
    }
}

/// Error raised by the evaluation service. Either kind aborts the evaluation.
#[derive(Debug, thiserror::Error)]
pub enum QuestServiceError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Moderation(#[from] ModerationError),
}
