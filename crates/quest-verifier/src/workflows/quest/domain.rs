use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::{Uuid, Version};

/// Identifier wrapper for quests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestId(pub Uuid);

/// Identifier wrapper for submitting users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl fmt::Display for QuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Composite ledger key: one scored attempt per (quest, user) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompletionKey {
    pub quest_id: QuestId,
    pub user_id: UserId,
}

impl CompletionKey {
    pub fn new(quest_id: QuestId, user_id: UserId) -> Self {
        Self { quest_id, user_id }
    }
}

impl fmt::Display for CompletionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.quest_id, self.user_id)
    }
}

/// Quest submission as received from the transport layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    #[serde(rename = "questId", alias = "quest_id")]
    pub quest_id: QuestId,
    #[serde(rename = "userId", alias = "user_id")]
    pub user_id: UserId,
    #[serde(deserialize_with = "deserialize_instant")]
    pub claimed_at: DateTime<Utc>,
    #[serde(rename = "access_condition", alias = "access_conditions", default)]
    pub access_conditions: Vec<Condition>,
    #[serde(rename = "user_data", alias = "user_profile")]
    pub user_profile: UserProfile,
    pub submission_text: String,
}

impl SubmissionRequest {
    pub fn completion_key(&self) -> CompletionKey {
        CompletionKey::new(self.quest_id, self.user_id)
    }

    /// Boundary checks applied before a request reaches the evaluator.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_v4("questId", &self.quest_id.0)?;
        require_v4("userId", &self.user_id.0)?;
        for quest in &self.user_profile.completed_quests {
            require_v4("completed_quests", &quest.0)?;
        }

        if let Some(asset) = self
            .user_profile
            .owned_assets
            .iter()
            .find(|asset| !is_hex_identifier(asset))
        {
            return Err(ValidationError::InvalidAssetIdentifier(asset.clone()));
        }

        if self.user_profile.level == 0 {
            return Err(ValidationError::NonPositiveLevel);
        }

        if self.submission_text.is_empty() {
            return Err(ValidationError::EmptySubmissionText);
        }

        Ok(())
    }
}

/// Zone-less layouts accepted after RFC 3339; they are read as UTC.
const NAIVE_INSTANT_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parses the ISO-8601 timestamp forms accepted for claim times and date
/// conditions. Values without an offset are taken as UTC, and a bare date is
/// UTC midnight.
pub(crate) fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%:z") {
        return Some(parsed.with_timezone(&Utc));
    }

    let naive = raw.strip_suffix(['Z', 'z']).unwrap_or(raw);
    NAIVE_INSTANT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(naive, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(naive, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|instant| instant.and_utc())
}

fn deserialize_instant<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_instant(&raw)
        .ok_or_else(|| de::Error::custom(format!("'{raw}' is not an ISO-8601 timestamp")))
}

fn require_v4(field: &'static str, id: &Uuid) -> Result<(), ValidationError> {
    if id.get_version() == Some(Version::Random) {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedIdentifier { field, value: *id })
    }
}

fn is_hex_identifier(raw: &str) -> bool {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Profile snapshot supplied alongside the submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub completed_quests: BTreeSet<QuestId>,
    #[serde(rename = "nfts", alias = "owned_assets", default)]
    pub owned_assets: BTreeSet<String>,
    pub level: u32,
}

/// Access condition in its wire form. See [`super::AccessCondition`] for the typed form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type", alias = "kind")]
    pub kind: ConditionKind,
    pub operator: ConditionOperator,
    pub value: String,
}

/// Condition family. Unrecognised kinds are kept verbatim so they can be reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionKind {
    AssetOwnership,
    Date,
    Level,
    Unknown(String),
}

impl From<String> for ConditionKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "nft" | "asset_ownership" => Self::AssetOwnership,
            "date" => Self::Date,
            "level" => Self::Level,
            _ => Self::Unknown(value),
        }
    }
}

impl From<ConditionKind> for String {
    fn from(value: ConditionKind) -> Self {
        match value {
            ConditionKind::AssetOwnership => "nft".to_string(),
            ConditionKind::Date => "date".to_string(),
            ConditionKind::Level => "level".to_string(),
            ConditionKind::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionKind::AssetOwnership => f.write_str("nft"),
            ConditionKind::Date => f.write_str("date"),
            ConditionKind::Level => f.write_str("level"),
            ConditionKind::Unknown(raw) => f.write_str(raw),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionOperator {
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "notContains", alias = "not_contains", alias = "not-contains")]
    NotContains,
    #[serde(rename = "<", alias = "less_than", alias = "less-than")]
    LessThan,
    #[serde(rename = ">", alias = "greater_than", alias = "greater-than")]
    GreaterThan,
    #[serde(rename = "=", alias = "equals")]
    Equals,
}

impl ConditionOperator {
    pub const fn symbol(self) -> &'static str {
        match self {
            ConditionOperator::Contains => "contains",
            ConditionOperator::NotContains => "notContains",
            ConditionOperator::LessThan => "<",
            ConditionOperator::GreaterThan => ">",
            ConditionOperator::Equals => "=",
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestStatus {
    Success,
    Fail,
}

impl QuestStatus {
    pub const fn label(self) -> &'static str {
        match self {
            QuestStatus::Success => "success",
            QuestStatus::Fail => "fail",
        }
    }
}

/// Outcome returned once per evaluated submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub status: QuestStatus,
    pub score: u32,
}

impl EvaluationResult {
    /// The `{fail, 0}` outcome used for gated and already-consumed attempts.
    pub const fn rejected() -> Self {
        Self {
            status: QuestStatus::Fail,
            score: 0,
        }
    }
}

/// Malformed request shape, rejected before evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be a version 4 UUID (got {value})")]
    UnsupportedIdentifier { field: &'static str, value: Uuid },
    #[error("asset identifier '{0}' is not hexadecimal")]
    InvalidAssetIdentifier(String),
    #[error("level must be a positive integer")]
    NonPositiveLevel,
    #[error("submission_text must not be empty")]
    EmptySubmissionText,
}
