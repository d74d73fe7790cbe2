//! Banking domain records (customers, accounts, transactions).
//!
//! These are the shapes the banking backend speaks on the wire. The backend
//! is the authority for every invariant that spans records (e.g. an account's
//! customer must exist); this crate only models and checks single values.

pub mod account;
pub mod customer;
pub mod transaction;

pub use account::{Account, AccountDraft};
pub use customer::{Customer, CustomerDraft, Role};
pub use transaction::{Transaction, TransactionDraft, TransactionKind};
