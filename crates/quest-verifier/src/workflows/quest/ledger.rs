use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::domain::{CompletionKey, EvaluationResult, QuestId, UserId};

/// State of a consumed (quest, user) attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CompletionEntry {
    /// Condition gating passed and scoring is in flight.
    Reserved { reserved_at: DateTime<Utc> },
    Completed {
        result: EvaluationResult,
        completed_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    Acquired,
    AlreadyConsumed,
}

/// Storage abstraction for the single-attempt ledger.
///
/// `reserve` must be an atomic insert-if-absent: two concurrent callers for the
/// same key may never both observe [`Reservation::Acquired`].
#[async_trait]
pub trait CompletionLedger: Send + Sync {
    async fn lookup(&self, key: &CompletionKey) -> Result<Option<CompletionEntry>, LedgerError>;
    async fn reserve(&self, key: &CompletionKey) -> Result<Reservation, LedgerError>;
    async fn complete(
        &self,
        key: &CompletionKey,
        result: EvaluationResult,
    ) -> Result<(), LedgerError>;
    /// Drops a reservation whose evaluation aborted before producing a result.
    async fn release(&self, key: &CompletionKey) -> Result<(), LedgerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("completion ledger unavailable: {0}")]
    Unavailable(String),
}

/// Process-local ledger. Entries are never expired.
#[derive(Debug, Default)]
pub struct InMemoryCompletionLedger {
    entries: DashMap<CompletionKey, CompletionEntry>,
}

impl InMemoryCompletionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CompletionLedger for InMemoryCompletionLedger {
    async fn lookup(&self, key: &CompletionKey) -> Result<Option<CompletionEntry>, LedgerError> {
        Ok(self.entries.get(key).map(|entry| *entry.value()))
    }

    async fn reserve(&self, key: &CompletionKey) -> Result<Reservation, LedgerError> {
        match self.entries.entry(*key) {
            Entry::Occupied(_) => Ok(Reservation::AlreadyConsumed),
            Entry::Vacant(slot) => {
                slot.insert(CompletionEntry::Reserved {
                    reserved_at: Utc::now(),
                });
                Ok(Reservation::Acquired)
            }
        }
    }

    async fn complete(
        &self,
        key: &CompletionKey,
        result: EvaluationResult,
    ) -> Result<(), LedgerError> {
        self.entries.insert(
            *key,
            CompletionEntry::Completed {
                result,
                completed_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn release(&self, key: &CompletionKey) -> Result<(), LedgerError> {
        self.entries
            .remove_if(key, |_, entry| matches!(entry, CompletionEntry::Reserved { .. }));
        Ok(())
    }
}

/// Public view of a (quest, user) pair's ledger state.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionView {
    pub quest_id: QuestId,
    pub user_id: UserId,
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<EvaluationResult>,
}

impl CompletionView {
    pub fn new(key: CompletionKey, entry: Option<CompletionEntry>) -> Self {
        let (state, result) = match entry {
            None => ("available", None),
            Some(CompletionEntry::Reserved { .. }) => ("reserved", None),
            Some(CompletionEntry::Completed { result, .. }) => ("completed", Some(result)),
        };
        Self {
            quest_id: key.quest_id,
            user_id: key.user_id,
            state,
            result,
        }
    }
}
