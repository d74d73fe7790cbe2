//! Entity-generic payloads travelling through the gateway.

use serde::Serialize;

use bankconsole_accounts::{
    Account, AccountDraft, Customer, CustomerDraft, Transaction, TransactionDraft,
};
use bankconsole_core::Entity;

use crate::capability::EntityKind;
use crate::error::GatewayResult;

/// A record as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Customer(Customer),
    Account(Account),
    Transaction(Transaction),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Record::Customer(_) => EntityKind::Customer,
            Record::Account(_) => EntityKind::Account,
            Record::Transaction(_) => EntityKind::Transaction,
        }
    }

    /// Backend key of this record, if assigned.
    pub fn id(&self) -> Option<i64> {
        match self {
            Record::Customer(c) => c.id().map(i64::from),
            Record::Account(a) => a.id().map(i64::from),
            Record::Transaction(t) => t.id().map(i64::from),
        }
    }

    /// Decode a JSON body as a record of `kind`.
    pub fn from_json(kind: EntityKind, bytes: &[u8]) -> GatewayResult<Self> {
        Ok(match kind {
            EntityKind::Customer => Record::Customer(serde_json::from_slice(bytes)?),
            EntityKind::Account => Record::Account(serde_json::from_slice(bytes)?),
            EntityKind::Transaction => Record::Transaction(serde_json::from_slice(bytes)?),
        })
    }

    /// Decode a JSON array body as records of `kind`.
    pub fn list_from_json(kind: EntityKind, bytes: &[u8]) -> GatewayResult<Vec<Self>> {
        Ok(match kind {
            EntityKind::Customer => serde_json::from_slice::<Vec<Customer>>(bytes)?
                .into_iter()
                .map(Record::Customer)
                .collect(),
            EntityKind::Account => serde_json::from_slice::<Vec<Account>>(bytes)?
                .into_iter()
                .map(Record::Account)
                .collect(),
            EntityKind::Transaction => serde_json::from_slice::<Vec<Transaction>>(bytes)?
                .into_iter()
                .map(Record::Transaction)
                .collect(),
        })
    }

    pub fn as_customer(&self) -> Option<&Customer> {
        match self {
            Record::Customer(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_account(&self) -> Option<&Account> {
        match self {
            Record::Account(a) => Some(a),
            _ => None,
        }
    }
}

/// A write-side payload (create body or partial-update changes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Draft {
    Customer(CustomerDraft),
    Account(AccountDraft),
    Transaction(TransactionDraft),
}

impl Draft {
    pub fn kind(&self) -> EntityKind {
        match self {
            Draft::Customer(_) => EntityKind::Customer,
            Draft::Account(_) => EntityKind::Account,
            Draft::Transaction(_) => EntityKind::Transaction,
        }
    }

    /// Full-object record carrying `id`, as the `edit` alias expects.
    ///
    /// Returns `None` for transactions, which cannot be edited.
    pub fn into_record(self, id: i64) -> Option<Record> {
        match self {
            Draft::Customer(d) => Some(Record::Customer(d.into_customer(Some(id.into())))),
            Draft::Account(d) => Some(Record::Account(d.into_account(Some(id.into())))),
            Draft::Transaction(_) => None,
        }
    }
}
