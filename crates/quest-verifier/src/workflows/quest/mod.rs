//! Quest submission verification: access-condition gating, heuristic scoring,
//! moderation veto, and the single-attempt completion ledger.

pub mod conditions;
pub mod domain;
pub mod ledger;
pub mod moderation;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use conditions::{AccessCondition, Comparison, ConditionError, Membership};
pub use domain::{
    CompletionKey, Condition, ConditionKind, ConditionOperator, EvaluationResult, QuestId,
    QuestStatus, SubmissionRequest, UserId, UserProfile, ValidationError,
};
pub use ledger::{
    CompletionEntry, CompletionLedger, CompletionView, InMemoryCompletionLedger, LedgerError,
    Reservation,
};
pub use moderation::{KeywordModerator, ModerationError, ModerationService};
pub use router::quest_router;
pub use scoring::{ScoreBreakdown, ScoreComponent, ScoringEngine, ScoringRule};
pub use service::{EvaluationReport, QuestEvaluationService, QuestServiceError, PASS_THRESHOLD};
