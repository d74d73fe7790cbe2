use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bankconsole_core::{AccountId, DomainError, DomainResult, Entity, TransactionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

/// Transaction record as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<TransactionId>,
    pub account: AccountId,
    pub transaction_type: TransactionKind,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for Transaction {
    type Id = TransactionId;

    fn id(&self) -> Option<TransactionId> {
        self.transaction_id
    }
}

/// Request to perform a transaction against an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    pub account: AccountId,
    pub transaction_type: TransactionKind,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

impl TransactionDraft {
    /// Amounts must be strictly positive; direction is carried by the kind.
    pub fn new(account: AccountId, kind: TransactionKind, amount: Decimal) -> DomainResult<Self> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::validation("transaction amount must be positive"));
        }
        Ok(Self {
            account,
            transaction_type: kind,
            amount,
        })
    }
}
