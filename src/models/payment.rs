use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle status of a payment.
///
/// `Success` and `Failure` are terminal: once a payment reaches either, no
/// further status write is permitted. `Canceled` is deliberately *not*
/// terminal, matching the emulator's current state machine (a canceled
/// payment still accepts writes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    New,
    Error,
    Success,
    Failure,
    Canceled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::New => "new",
            PaymentStatus::Error => "error",
            PaymentStatus::Success => "success",
            PaymentStatus::Failure => "failure",
            PaymentStatus::Canceled => "canceled",
        }
    }

    /// True for statuses frozen against any further mutation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Success | PaymentStatus::Failure)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown payment status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for PaymentStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(PaymentStatus::New),
            "error" => Ok(PaymentStatus::Error),
            "success" => Ok(PaymentStatus::Success),
            "failure" => Ok(PaymentStatus::Failure),
            "canceled" => Ok(PaymentStatus::Canceled),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = ParseStatusError;

    fn try_from(value: String) -> Result<Self, ParseStatusError> {
        value.parse()
    }
}

/// A persisted payment row. Timestamps are owned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Payment {
    pub id: i64,
    pub user_id: i64,
    pub user_email: String,
    pub amount: f64,
    pub currency: String,
    #[sqlx(try_from = "String")]
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Creation input. Amount and currency are opaque here; nothing in the
/// engine validates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayment {
    pub user_id: i64,
    pub user_email: String,
    pub amount: f64,
    pub currency: String,
}

/// Lookup key for listing a user's payments: exactly one of user id or
/// user email, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentFilter {
    ByUser(i64),
    ByEmail(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("exactly one of user id or user email must be supplied")]
pub struct AmbiguousFilter;

impl PaymentFilter {
    /// Builds a filter from optional query parts, rejecting the
    /// both-set and neither-set cases instead of guessing a column.
    pub fn from_parts(
        user_id: Option<i64>,
        user_email: Option<String>,
    ) -> Result<Self, AmbiguousFilter> {
        match (user_id, user_email) {
            (Some(id), None) => Ok(PaymentFilter::ByUser(id)),
            (None, Some(email)) => Ok(PaymentFilter::ByEmail(email)),
            _ => Err(AmbiguousFilter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            PaymentStatus::New,
            PaymentStatus::Error,
            PaymentStatus::Success,
            PaymentStatus::Failure,
            PaymentStatus::Canceled,
        ] {
            assert_eq!(status.as_str().parse::<PaymentStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_text_is_rejected() {
        let err = "pending".parse::<PaymentStatus>().unwrap_err();
        assert_eq!(err, ParseStatusError("pending".to_string()));
    }

    #[test]
    fn only_success_and_failure_are_terminal() {
        assert!(PaymentStatus::Success.is_terminal());
        assert!(PaymentStatus::Failure.is_terminal());
        assert!(!PaymentStatus::New.is_terminal());
        assert!(!PaymentStatus::Error.is_terminal());
        assert!(!PaymentStatus::Canceled.is_terminal());
    }

    #[test]
    fn filter_requires_exactly_one_key() {
        assert_eq!(
            PaymentFilter::from_parts(Some(7), None),
            Ok(PaymentFilter::ByUser(7))
        );
        assert_eq!(
            PaymentFilter::from_parts(None, Some("a@b.com".into())),
            Ok(PaymentFilter::ByEmail("a@b.com".into()))
        );
        assert_eq!(
            PaymentFilter::from_parts(Some(7), Some("a@b.com".into())),
            Err(AmbiguousFilter)
        );
        assert_eq!(PaymentFilter::from_parts(None, None), Err(AmbiguousFilter));
    }
}
