mod rules;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use rules::{JOYFUL_WORDS, JOYFUL_WORD_CAP};

/// Heuristic contributing to a submission score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringRule {
    Punctuation,
    Palindrome,
    JoyfulWords,
    Repetition,
}

/// Points awarded by a single rule, kept for audit and logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub rule: ScoringRule,
    pub points: u32,
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub components: Vec<ScoreComponent>,
    pub total: u32,
}

impl ScoreBreakdown {
    pub fn points_for(&self, rule: ScoringRule) -> u32 {
        self.components
            .iter()
            .filter(|component| component.rule == rule)
            .map(|component| component.points)
            .sum()
    }
}

/// Stateless scorer summing the independent text heuristics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, text: &str) -> ScoreBreakdown {
        let components: Vec<ScoreComponent> = [
            rules::punctuation(text),
            rules::palindrome(text),
            rules::joyful_words(text),
            rules::repetition(text),
        ]
        .into_iter()
        .flatten()
        .collect();

        for component in &components {
            debug!(
                rule = ?component.rule,
                points = component.points,
                notes = %component.notes,
                "score component awarded"
            );
        }

        let total = components.iter().map(|component| component.points).sum();
        ScoreBreakdown { components, total }
    }
}
