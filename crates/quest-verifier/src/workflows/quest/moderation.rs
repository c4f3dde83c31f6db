use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

/// Content moderation collaborator consulted before a score is finalised.
#[async_trait]
pub trait ModerationService: Send + Sync {
    async fn is_disallowed(&self, text: &str) -> Result<bool, ModerationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    #[error("moderation service unavailable: {0}")]
    Unavailable(String),
    #[error("moderation check exceeded {0:?}")]
    Timeout(Duration),
}

/// Placeholder moderator: case-insensitive substring match against a blocklist.
#[derive(Debug, Clone)]
pub struct KeywordModerator {
    blocked_terms: Vec<String>,
}

impl KeywordModerator {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let blocked_terms = terms
            .into_iter()
            .map(|term| term.as_ref().trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect();
        Self { blocked_terms }
    }

    pub fn blocked_terms(&self) -> &[String] {
        &self.blocked_terms
    }
}

impl Default for KeywordModerator {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_BLOCKED_TERMS)
    }
}

#[async_trait]
impl ModerationService for KeywordModerator {
    async fn is_disallowed(&self, text: &str) -> Result<bool, ModerationError> {
        let lowered = text.to_lowercase();
        match self
            .blocked_terms
            .iter()
            .find(|term| lowered.contains(term.as_str()))
        {
            Some(term) => {
                debug!(term = %term, "submission matched blocked term");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
