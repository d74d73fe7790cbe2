use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bankconsole_core::{AccountId, CustomerId, Entity};

/// Account record as returned by the backend.
///
/// `customer` references the owning customer; the backend enforces that it
/// exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,
    pub customer: CustomerId,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> Option<AccountId> {
        self.account_id
    }
}

/// Write-side account payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDraft {
    pub customer: CustomerId,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

impl AccountDraft {
    pub fn into_account(self, id: Option<AccountId>) -> Account {
        Account {
            account_id: id,
            customer: self.customer,
            balance: self.balance,
        }
    }
}
