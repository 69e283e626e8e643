//! Error kinds for every engine operation.
//!
//! Callers branch on [`ErrorKind`]; the `Display` text is the human-readable
//! reason surfaced to the UI and must not be pattern-matched.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

/// Result type for engine operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Record families an id can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entity {
    User,
    Tournament,
    Result,
    Guild,
    GuildWar,
    Deposit,
    Withdrawal,
    VipPlan,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::User => "User",
            Entity::Tournament => "Tournament",
            Entity::Result => "Result",
            Entity::Guild => "Guild",
            Entity::GuildWar => "Guild war",
            Entity::Deposit => "Deposit",
            Entity::Withdrawal => "Withdrawal",
            Entity::VipPlan => "VIP plan",
        };
        f.write_str(name)
    }
}

/// Engine errors. All are recoverable business-rule violations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum LedgerError {
    #[error("{0} not found: {1}")]
    NotFound(Entity, u64),

    #[error("{0} id not found: {1}")]
    NotFoundNamed(Entity, String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(Money),

    #[error("Amount out of range: adding {0} would overflow")]
    Overflow(Money),

    #[error("Insufficient funds: have {available}, need {required}")]
    InsufficientFunds { available: Money, required: Money },

    #[error("Tournament is full ({capacity} participants)")]
    Capacity { capacity: u32 },

    #[error("{0}")]
    DuplicateAction(String),

    #[error("{0}")]
    LimitExceeded(String),

    #[error("{0}")]
    AlreadyResolved(String),

    #[error("{0}")]
    PreconditionFailed(String),
}

/// Machine-branchable failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    InvalidAmount,
    InsufficientFunds,
    Capacity,
    DuplicateAction,
    LimitExceeded,
    AlreadyResolved,
    PreconditionFailed,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::NotFound(..) | LedgerError::NotFoundNamed(..) => ErrorKind::NotFound,
            LedgerError::InvalidAmount(_) | LedgerError::Overflow(_) => ErrorKind::InvalidAmount,
            LedgerError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            LedgerError::Capacity { .. } => ErrorKind::Capacity,
            LedgerError::DuplicateAction(_) => ErrorKind::DuplicateAction,
            LedgerError::LimitExceeded(_) => ErrorKind::LimitExceeded,
            LedgerError::AlreadyResolved(_) => ErrorKind::AlreadyResolved,
            LedgerError::PreconditionFailed(_) => ErrorKind::PreconditionFailed,
        }
    }

    pub(crate) fn precondition(msg: impl Into<String>) -> Self {
        LedgerError::PreconditionFailed(msg.into())
    }
}

// ============================================================================
// OPERATION OUTCOME
// ============================================================================

/// Success flag plus reason string, the shape every operation is reported in
/// to a UI or HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl OperationOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            kind: None,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data<T: Serialize>(mut self, data: &T) -> Self {
        self.data = serde_json::to_value(data).ok();
        self
    }

    pub fn failed(err: &LedgerError) -> Self {
        Self {
            success: false,
            kind: Some(err.kind()),
            message: err.to_string(),
            data: None,
        }
    }

    /// Build an outcome from an operation result, serializing the success value.
    pub fn from_result<T: Serialize>(result: &LedgerResult<T>, success_message: &str) -> Self {
        match result {
            Ok(value) => Self::ok(success_message).with_data(value),
            Err(e) => Self::failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_error_display() {
        let err = LedgerError::InsufficientFunds {
            available: Decimal::from(40),
            required: Decimal::from(50),
        };
        assert_eq!(err.to_string(), "Insufficient funds: have 40, need 50");
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);

        let err = LedgerError::NotFound(Entity::GuildWar, 7);
        assert_eq!(err.to_string(), "Guild war not found: 7");
    }

    #[test]
    fn test_outcome_from_result() {
        let ok: LedgerResult<u64> = Ok(42);
        let outcome = OperationOutcome::from_result(&ok, "Joined");
        assert!(outcome.success);
        assert_eq!(outcome.data, Some(serde_json::json!(42)));

        let err: LedgerResult<u64> = Err(LedgerError::Capacity { capacity: 50 });
        let outcome = OperationOutcome::from_result(&err, "Joined");
        assert!(!outcome.success);
        assert_eq!(outcome.kind, Some(ErrorKind::Capacity));
    }
}
