use chrono::{DateTime, Utc};
use tracing::info;

use super::domain::{parse_instant, Condition, ConditionKind, ConditionOperator, SubmissionRequest};

/// Set-membership operators for asset-ownership gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Contains,
    NotContains,
}

/// Ordering operators shared by date and level gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    LessThan,
    GreaterThan,
    Equals,
}

impl Comparison {
    fn holds<T: PartialOrd>(self, actual: &T, expected: &T) -> bool {
        match self {
            Comparison::LessThan => actual < expected,
            Comparison::GreaterThan => actual > expected,
            Comparison::Equals => actual == expected,
        }
    }
}

/// Typed access gate. Every variant carries only the operators meaningful for it.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessCondition {
    AssetOwnership {
        operator: Membership,
        asset: String,
    },
    Date {
        operator: Comparison,
        instant: DateTime<Utc>,
    },
    Level {
        operator: Comparison,
        threshold: f64,
    },
}

impl AccessCondition {
    pub fn parse(condition: &Condition) -> Result<Self, ConditionError> {
        let unsupported = || ConditionError::UnsupportedOperator {
            kind: condition.kind.to_string(),
            operator: condition.operator,
        };

        match &condition.kind {
            ConditionKind::AssetOwnership => {
                let operator = match condition.operator {
                    ConditionOperator::Contains => Membership::Contains,
                    ConditionOperator::NotContains => Membership::NotContains,
                    _ => return Err(unsupported()),
                };
                Ok(Self::AssetOwnership {
                    operator,
                    asset: condition.value.clone(),
                })
            }
            ConditionKind::Date => {
                let operator = comparison(condition.operator).ok_or_else(unsupported)?;
                let instant = parse_instant(&condition.value).ok_or_else(|| {
                    ConditionError::InvalidDate {
                        value: condition.value.clone(),
                    }
                })?;
                Ok(Self::Date { operator, instant })
            }
            ConditionKind::Level => {
                let operator = comparison(condition.operator).ok_or_else(unsupported)?;
                let threshold = condition
                    .value
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .ok_or_else(|| ConditionError::InvalidLevel {
                        value: condition.value.clone(),
                    })?;
                Ok(Self::Level {
                    operator,
                    threshold,
                })
            }
            ConditionKind::Unknown(kind) => Err(ConditionError::UnknownKind(kind.clone())),
        }
    }

    pub fn is_satisfied(&self, request: &SubmissionRequest) -> bool {
        match self {
            AccessCondition::AssetOwnership { operator, asset } => {
                check_asset_ownership(request, *operator, asset)
            }
            AccessCondition::Date { operator, instant } => check_date(request, *operator, instant),
            AccessCondition::Level {
                operator,
                threshold,
            } => check_level(request, *operator, *threshold),
        }
    }
}

fn comparison(operator: ConditionOperator) -> Option<Comparison> {
    match operator {
        ConditionOperator::LessThan => Some(Comparison::LessThan),
        ConditionOperator::GreaterThan => Some(Comparison::GreaterThan),
        ConditionOperator::Equals => Some(Comparison::Equals),
        ConditionOperator::Contains | ConditionOperator::NotContains => None,
    }
}

/// Accepts RFC 3339, a zone-less date-time (read as UTC), or a bare date (UTC midnight).
pub fn check_asset_ownership(
    request: &SubmissionRequest,
    operator: Membership,
    asset: &str,
) -> bool {
    let owned = request.user_profile.owned_assets.contains(asset);
    let satisfied = match operator {
        Membership::Contains => owned,
        Membership::NotContains => !owned,
    };

    if !satisfied {
        info!(
            quest_id = %request.quest_id,
            user_id = %request.user_id,
            asset,
            ?operator,
            "asset ownership condition not met"
        );
    }
    satisfied
}

pub fn check_date(
    request: &SubmissionRequest,
    operator: Comparison,
    instant: &DateTime<Utc>,
) -> bool {
    let satisfied = operator.holds(&request.claimed_at, instant);
    if !satisfied {
        info!(
            quest_id = %request.quest_id,
            user_id = %request.user_id,
            claimed_at = %request.claimed_at,
            condition = %instant,
            ?operator,
            "claim date condition not met"
        );
    }
    satisfied
}

pub fn check_level(request: &SubmissionRequest, operator: Comparison, threshold: f64) -> bool {
    let level = f64::from(request.user_profile.level);
    let satisfied = operator.holds(&level, &threshold);
    if !satisfied {
        info!(
            quest_id = %request.quest_id,
            user_id = %request.user_id,
            level = request.user_profile.level,
            threshold,
            ?operator,
            "level condition not met"
        );
    }
    satisfied
}

/// Gate that cannot be evaluated. Always treated as a failing condition.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConditionError {
    #[error("unknown condition type '{0}'")]
    UnknownKind(String),
    #[error("operator '{operator}' is not supported for '{kind}' conditions")]
    UnsupportedOperator {
        kind: String,
        operator: ConditionOperator,
    },
    #[error("'{value}' is not a valid date")]
    InvalidDate { value: String },
    #[error("'{value}' is not a numeric level")]
    InvalidLevel { value: String },
}
