//! Capability descriptor: which operation aliases a deployment implements.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Entity families exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Customer,
    Account,
    Transaction,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Customer,
        EntityKind::Account,
        EntityKind::Transaction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Customer => "customer",
            EntityKind::Account => "account",
            EntityKind::Transaction => "transaction",
        }
    }

    /// REST collection segment (`/customers`, ...).
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Customer => "customers",
            EntityKind::Account => "accounts",
            EntityKind::Transaction => "transactions",
        }
    }

    /// Human label used in screen titles and outcome messages.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Customer => "Customer",
            EntityKind::Account => "Account",
            EntityKind::Transaction => "Transaction",
        }
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical operation names accumulated by the backend over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// `add`: create a new record.
    Create,
    /// `get-all`: list every record.
    FetchAll,
    /// `list`: later alias of `get-all`.
    FetchAllAlias,
    /// `get`: fetch one record by id.
    FetchById,
    Delete,
    /// `edit`: full-object update, id carried inside the body.
    UpdateFull,
    /// `update`: partial update addressed by id.
    UpdatePartial,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::Create,
        Operation::FetchAll,
        Operation::FetchAllAlias,
        Operation::FetchById,
        Operation::Delete,
        Operation::UpdateFull,
        Operation::UpdatePartial,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Operation::Create => "add",
            Operation::FetchAll => "get-all",
            Operation::FetchAllAlias => "list",
            Operation::FetchById => "get",
            Operation::Delete => "delete",
            Operation::UpdateFull => "edit",
            Operation::UpdatePartial => "update",
        }
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.tag())
    }
}

/// One supported (entity, operation) pair, written `customer.update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Capability {
    pub entity: EntityKind,
    pub operation: Operation,
}

impl Capability {
    pub const fn new(entity: EntityKind, operation: Operation) -> Self {
        Self { entity, operation }
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}", self.entity, self.operation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown capability tag {0:?} (expected <customer|account|transaction>.<add|get-all|list|get|delete|edit|update>)")]
pub struct ParseCapabilityError(pub String);

impl FromStr for Capability {
    type Err = ParseCapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let (entity, op) = raw
            .split_once('.')
            .ok_or_else(|| ParseCapabilityError(raw.to_string()))?;
        let entity = EntityKind::ALL
            .into_iter()
            .find(|k| k.as_str() == entity.to_lowercase())
            .ok_or_else(|| ParseCapabilityError(raw.to_string()))?;
        let operation = Operation::ALL
            .into_iter()
            .find(|o| o.tag() == op.to_lowercase())
            .ok_or_else(|| ParseCapabilityError(raw.to_string()))?;
        Ok(Capability::new(entity, operation))
    }
}

/// The set of operation aliases a gateway instance implements.
///
/// Resolved once when the gateway is built; never changes afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayCapabilities {
    supported: BTreeSet<Capability>,
}

impl GatewayCapabilities {
    /// No operations at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// The complete surface of the current backend.
    ///
    /// Transactions can only be performed and listed.
    pub fn all() -> Self {
        let mut caps = Self::none();
        for entity in [EntityKind::Customer, EntityKind::Account] {
            for op in Operation::ALL {
                caps.insert(Capability::new(entity, op));
            }
        }
        for op in [Operation::Create, Operation::FetchAll, Operation::FetchAllAlias] {
            caps.insert(Capability::new(EntityKind::Transaction, op));
        }
        caps
    }

    pub fn with(mut self, entity: EntityKind, operation: Operation) -> Self {
        self.insert(Capability::new(entity, operation));
        self
    }

    pub fn without(mut self, entity: EntityKind, operation: Operation) -> Self {
        self.supported.remove(&Capability::new(entity, operation));
        self
    }

    pub fn insert(&mut self, capability: Capability) {
        self.supported.insert(capability);
    }

    pub fn remove_all<'a>(&mut self, capabilities: impl IntoIterator<Item = &'a Capability>) {
        for cap in capabilities {
            self.supported.remove(cap);
        }
    }

    pub fn supports(&self, entity: EntityKind, operation: Operation) -> bool {
        self.supported.contains(&Capability::new(entity, operation))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.supported.iter()
    }

    /// Parse a comma-separated tag list such as `customer.update, account.edit`.
    pub fn parse_tags(list: &str) -> Result<Vec<Capability>, ParseCapabilityError> {
        list.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(Capability::from_str)
            .collect()
    }
}

impl FromIterator<Capability> for GatewayCapabilities {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self {
            supported: iter.into_iter().collect(),
        }
    }
}
