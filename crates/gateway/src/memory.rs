//! In-memory gateway for tests/dev.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use bankconsole_accounts::{Account, Customer, Transaction};

use crate::capability::{Capability, EntityKind, GatewayCapabilities, Operation};
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::EntityGateway;
use crate::record::{Draft, Record};

/// One call that reached the in-memory backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub capability: Capability,
    pub id: Option<i64>,
    /// JSON body as it would have been sent over the wire.
    pub body: Option<Value>,
}

#[derive(Debug, Default)]
struct State {
    records: BTreeMap<(EntityKind, i64), Record>,
    next_id: i64,
    calls: Vec<RecordedCall>,
    failures: HashMap<Capability, GatewayError>,
    fetch_delays: HashMap<i64, Duration>,
}

/// In-memory backend.
///
/// - No IO
/// - Every supported call is recorded (see [`calls`](Self::calls))
/// - Failures and per-id fetch latency can be injected
#[derive(Debug)]
pub struct InMemoryGateway {
    capabilities: GatewayCapabilities,
    state: Mutex<State>,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new(GatewayCapabilities::all())
    }
}

impl InMemoryGateway {
    pub fn new(capabilities: GatewayCapabilities) -> Self {
        Self {
            capabilities,
            state: Mutex::new(State {
                next_id: 1,
                ..State::default()
            }),
        }
    }

    /// Seed a customer; an id is assigned when it has none.
    pub fn with_customer(self, customer: Customer) -> Self {
        self.seed(Record::Customer(customer));
        self
    }

    /// Seed an account; an id is assigned when it has none.
    pub fn with_account(self, account: Account) -> Self {
        self.seed(Record::Account(account));
        self
    }

    /// Make every call to `capability` fail with `error`.
    pub fn fail_on(self, capability: Capability, error: GatewayError) -> Self {
        self.lock().failures.insert(capability, error);
        self
    }

    /// Delay fetch-by-id responses for `id`.
    pub fn delay_fetch(self, id: i64, delay: Duration) -> Self {
        self.lock().fetch_delays.insert(id, delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Calls made through one capability.
    pub fn calls_to(&self, entity: EntityKind, operation: Operation) -> Vec<RecordedCall> {
        let cap = Capability::new(entity, operation);
        self.lock()
            .calls
            .iter()
            .filter(|c| c.capability == cap)
            .cloned()
            .collect()
    }

    pub fn get(&self, entity: EntityKind, id: i64) -> Option<Record> {
        self.lock().records.get(&(entity, id)).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test thread must not hide the recorded calls.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn seed(&self, record: Record) {
        let mut state = self.lock();
        let record = match record.id() {
            Some(_) => record,
            None => {
                let id = state.next_id;
                with_id(record, id)
            }
        };
        let id = record.id().unwrap_or_default();
        state.next_id = state.next_id.max(id + 1);
        state.records.insert((record.kind(), id), record);
    }

    /// Record the call, then apply any injected failure.
    fn begin(
        &self,
        entity: EntityKind,
        operation: Operation,
        id: Option<i64>,
        body: Option<Value>,
    ) -> GatewayResult<MutexGuard<'_, State>> {
        let capability = Capability::new(entity, operation);
        if !self.capabilities.supports(entity, operation) {
            return Err(GatewayError::CapabilityAbsent(capability));
        }

        let mut state = self.lock();
        state.calls.push(RecordedCall { capability, id, body });
        tracing::debug!(%capability, ?id, "in-memory gateway call");

        if let Some(err) = state.failures.get(&capability) {
            return Err(err.clone());
        }
        Ok(state)
    }

    fn list(&self, entity: EntityKind, operation: Operation) -> GatewayResult<Vec<Record>> {
        let state = self.begin(entity, operation, None, None)?;
        Ok(state
            .records
            .iter()
            .filter(|((kind, _), _)| *kind == entity)
            .map(|(_, r)| r.clone())
            .collect())
    }
}

fn with_id(record: Record, id: i64) -> Record {
    match record {
        Record::Customer(mut c) => {
            c.customer_id = Some(id.into());
            Record::Customer(c)
        }
        Record::Account(mut a) => {
            a.account_id = Some(id.into());
            Record::Account(a)
        }
        Record::Transaction(mut t) => {
            t.transaction_id = Some(id.into());
            Record::Transaction(t)
        }
    }
}

/// Apply partial `changes` onto `current`. Passwords are kept unless changed.
fn merge(current: Record, changes: Draft) -> GatewayResult<Record> {
    match (current, changes) {
        (Record::Customer(mut c), Draft::Customer(d)) => {
            c.name = d.name;
            c.email = d.email;
            c.username = d.username;
            c.role = d.role;
            if d.password.is_some() {
                c.password = d.password;
            }
            Ok(Record::Customer(c))
        }
        (Record::Account(mut a), Draft::Account(d)) => {
            a.customer = d.customer;
            a.balance = d.balance;
            Ok(Record::Account(a))
        }
        (current, changes) => Err(GatewayError::InvalidRequest(format!(
            "cannot apply {} changes to a {} record",
            changes.kind(),
            current.kind()
        ))),
    }
}

fn to_body(value: &impl serde::Serialize) -> Option<Value> {
    serde_json::to_value(value).ok()
}

#[async_trait]
impl EntityGateway for InMemoryGateway {
    fn capabilities(&self) -> &GatewayCapabilities {
        &self.capabilities
    }

    async fn create(&self, draft: Draft) -> GatewayResult<Record> {
        let entity = draft.kind();
        let mut state = self.begin(entity, Operation::Create, None, to_body(&draft))?;

        let id = state.next_id;
        state.next_id += 1;
        let record = match draft {
            Draft::Customer(d) => Record::Customer(d.into_customer(Some(id.into()))),
            Draft::Account(d) => Record::Account(d.into_account(Some(id.into()))),
            Draft::Transaction(d) => Record::Transaction(Transaction {
                transaction_id: Some(id.into()),
                account: d.account,
                transaction_type: d.transaction_type,
                amount: d.amount,
                created_at: Some(Utc::now()),
            }),
        };
        state.records.insert((entity, id), record.clone());
        Ok(record)
    }

    async fn fetch_all(&self, entity: EntityKind) -> GatewayResult<Vec<Record>> {
        self.list(entity, Operation::FetchAll)
    }

    async fn fetch_all_alias(&self, entity: EntityKind) -> GatewayResult<Vec<Record>> {
        self.list(entity, Operation::FetchAllAlias)
    }

    async fn fetch_by_id(&self, entity: EntityKind, id: i64) -> GatewayResult<Option<Record>> {
        let (found, delay) = {
            let state = self.begin(entity, Operation::FetchById, Some(id), None)?;
            (
                state.records.get(&(entity, id)).cloned(),
                state.fetch_delays.get(&id).copied(),
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(found)
    }

    async fn update_partial(&self, id: i64, changes: Draft) -> GatewayResult<Record> {
        let entity = changes.kind();
        let mut state =
            self.begin(entity, Operation::UpdatePartial, Some(id), to_body(&changes))?;

        let current = state
            .records
            .get(&(entity, id))
            .cloned()
            .ok_or(GatewayError::NotFound)?;
        let updated = merge(current, changes)?;
        state.records.insert((entity, id), updated.clone());
        Ok(updated)
    }

    async fn update_full(&self, record: Record) -> GatewayResult<Record> {
        let entity = record.kind();
        let id = record.id();
        let mut state = self.begin(entity, Operation::UpdateFull, id, to_body(&record))?;

        let id = id.ok_or_else(|| {
            GatewayError::InvalidRequest(format!("{entity} record has no id for a full update"))
        })?;
        state.next_id = state.next_id.max(id + 1);
        state.records.insert((entity, id), record.clone());
        Ok(record)
    }

    async fn delete(&self, entity: EntityKind, id: i64) -> GatewayResult<()> {
        let mut state = self.begin(entity, Operation::Delete, Some(id), None)?;
        state
            .records
            .remove(&(entity, id))
            .map(|_| ())
            .ok_or(GatewayError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankconsole_accounts::{AccountDraft, CustomerDraft, Role};
    use bankconsole_core::CustomerId;
    use rust_decimal::Decimal;

    fn ada() -> Customer {
        Customer {
            customer_id: None,
            name: "Ada".into(),
            email: "ada@example.com".into(),
            username: "ada".into(),
            password: Some("hunter22".into()),
            role: Role::Admin,
        }
    }

    #[tokio::test]
    async fn seeding_assigns_sequential_ids() {
        let gw = InMemoryGateway::default().with_customer(ada()).with_customer(ada());
        assert!(gw.get(EntityKind::Customer, 1).is_some());
        assert!(gw.get(EntityKind::Customer, 2).is_some());

        let created = gw
            .create(Draft::Account(AccountDraft {
                customer: CustomerId::new(1),
                balance: Decimal::from(5),
            }))
            .await
            .unwrap();
        assert_eq!(created.id(), Some(3));
    }

    #[tokio::test]
    async fn partial_update_keeps_password_when_not_changed() {
        let gw = InMemoryGateway::default().with_customer(ada());
        let updated = gw
            .update_partial(
                1,
                Draft::Customer(CustomerDraft {
                    name: "Ada L".into(),
                    email: "ada@example.com".into(),
                    username: "ada".into(),
                    password: None,
                    role: Role::User,
                }),
            )
            .await
            .unwrap();
        let customer = updated.as_customer().unwrap();
        assert_eq!(customer.name, "Ada L");
        assert_eq!(customer.password.as_deref(), Some("hunter22"));
    }

    #[tokio::test]
    async fn unsupported_calls_are_not_recorded() {
        let gw = InMemoryGateway::new(GatewayCapabilities::none());
        let err = gw.fetch_by_id(EntityKind::Customer, 1).await.unwrap_err();
        assert!(matches!(err, GatewayError::CapabilityAbsent(_)));
        assert!(gw.calls().is_empty());
    }

    #[tokio::test]
    async fn injected_failures_are_recorded_then_returned() {
        let cap = Capability::new(EntityKind::Customer, Operation::FetchById);
        let gw = InMemoryGateway::default().fail_on(cap, GatewayError::Api(500, "boom".into()));
        let err = gw.fetch_by_id(EntityKind::Customer, 1).await.unwrap_err();
        assert_eq!(err, GatewayError::Api(500, "boom".into()));
        assert_eq!(gw.calls().len(), 1);
    }

    #[tokio::test]
    async fn missing_record_fetches_as_none() {
        let gw = InMemoryGateway::default();
        assert_eq!(gw.fetch_by_id(EntityKind::Account, 42).await.unwrap(), None);
    }
}
