//! Edit session state machine.
//!
//! `Init → {CreateMode, LoadingUpdate} → Ready`. The session never performs
//! IO: [`EditSession::handle`] folds one event into the state and returns the
//! effects the controller has to run.

use std::collections::HashMap;

use rust_decimal::Decimal;

use bankconsole_accounts::{AccountDraft, Customer, CustomerDraft, Role};
use bankconsole_core::{CustomerId, DomainError};
use bankconsole_gateway::{Draft, EntityKind, GatewayCapabilities, Operation, Record};

use crate::error::{ConsoleError, ConsoleResult};
use crate::form::{FieldError, FieldValue, FormBuffer};
use crate::route::IdentifierSignal;
use crate::verb::{SubmitAction, VerbFallbackChain};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

impl From<Mode> for SubmitAction {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Create => SubmitAction::Create,
            Mode::Update => SubmitAction::Update,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    CreateMode,
    LoadingUpdate,
    Ready,
}

/// Per-deployment knobs of an edit session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Id probed when a screen mounts without any route context.
    pub default_probe_id: i64,
    pub default_password: String,
    pub listing_path: String,
    pub strict_capabilities: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            default_probe_id: 1,
            default_password: "Password@123".to_string(),
            listing_path: "/bank".to_string(),
            strict_capabilities: false,
        }
    }
}

/// Everything that can change a session, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Result of synchronous resolution at mount.
    Mounted(IdentifierSignal),
    /// Later emission of a route stream.
    RouteSignal(IdentifierSignal),
    Loaded { id: i64, record: Option<Record> },
    OptionsLoaded(Vec<Record>),
    /// Submit response; `None` when the terminal no-op answered.
    Submitted(Option<Record>),
}

/// The gateway call a submit resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    Create(Draft),
    UpdatePartial { id: i64, changes: Draft },
    UpdateFull(Record),
    /// Every alias of the verb is missing; succeeds without a request.
    NoOp,
}

impl GatewayCall {
    pub fn operation(&self) -> Option<Operation> {
        match self {
            GatewayCall::Create(_) => Some(Operation::Create),
            GatewayCall::UpdatePartial { .. } => Some(Operation::UpdatePartial),
            GatewayCall::UpdateFull(_) => Some(Operation::UpdateFull),
            GatewayCall::NoOp => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch { id: i64 },
    List { entity: EntityKind, operation: Operation },
    Invoke(GatewayCall),
    Navigate(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitPlan {
    /// Validation failed; every field is now touched and nothing is sent.
    Rejected(Vec<FieldError>),
    Dispatch(GatewayCall),
}

#[derive(Debug, Clone)]
pub struct EditSession {
    entity: EntityKind,
    capabilities: GatewayCapabilities,
    settings: SessionSettings,
    phase: Phase,
    mode: Mode,
    title: String,
    target_id: Option<i64>,
    loaded: Option<Record>,
    form: FormBuffer,
    last_outcome: String,
    customer_options: Vec<Customer>,
    verbs: HashMap<SubmitAction, Option<Operation>>,
}

impl EditSession {
    pub fn new(
        entity: EntityKind,
        capabilities: GatewayCapabilities,
        settings: SessionSettings,
    ) -> ConsoleResult<Self> {
        if entity == EntityKind::Transaction {
            return Err(ConsoleError::invalid_state("transactions have no edit screen"));
        }
        Ok(Self {
            entity,
            capabilities,
            settings,
            phase: Phase::Init,
            mode: Mode::Update,
            title: title_for(Mode::Update, entity),
            target_id: None,
            loaded: None,
            form: FormBuffer::for_entity(entity),
            last_outcome: String::new(),
            customer_options: Vec::new(),
            verbs: HashMap::new(),
        })
    }

    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn target_id(&self) -> Option<i64> {
        self.target_id
    }

    pub fn loaded_entity(&self) -> Option<&Record> {
        self.loaded.as_ref()
    }

    pub fn form(&self) -> &FormBuffer {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormBuffer {
        &mut self.form
    }

    pub fn is_valid(&self) -> bool {
        self.form.is_valid()
    }

    pub fn last_outcome_message(&self) -> &str {
        &self.last_outcome
    }

    pub fn customer_options(&self) -> &[Customer] {
        &self.customer_options
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Verb chosen for `action` so far; `None` until the first submit.
    pub fn resolved_verb(&self, action: SubmitAction) -> Option<Option<Operation>> {
        self.verbs.get(&action).copied()
    }

    pub fn handle(&mut self, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::Mounted(signal) => self.mount(signal),
            SessionEvent::RouteSignal(signal) => self.apply_signal(signal),
            SessionEvent::Loaded { id, record } => self.apply_load(id, record),
            SessionEvent::OptionsLoaded(records) => {
                self.customer_options = records
                    .into_iter()
                    .filter_map(|r| match r {
                        Record::Customer(c) => Some(c),
                        _ => None,
                    })
                    .collect();
                Vec::new()
            }
            SessionEvent::Submitted(record) => {
                if let Some(record) = record {
                    self.loaded = Some(record);
                }
                // Same wording for create and update.
                self.last_outcome = format!("{} updated successfully", self.entity.label());
                tracing::info!(entity = %self.entity, target_id = ?self.target_id, "submit succeeded");
                vec![Effect::Navigate(self.settings.listing_path.clone())]
            }
        }
    }

    /// Listing request for the customer selector of an account screen.
    pub fn options_request(&self) -> Option<Effect> {
        if self.entity != EntityKind::Account {
            return None;
        }
        VerbFallbackChain::listing()
            .resolve(&self.capabilities, EntityKind::Customer)
            .map(|operation| Effect::List {
                entity: EntityKind::Customer,
                operation,
            })
    }

    /// Validate and pick the gateway call for the current mode.
    pub fn plan_submit(&mut self) -> ConsoleResult<SubmitPlan> {
        match self.phase {
            Phase::Init => return Err(ConsoleError::invalid_state("submit before mount")),
            Phase::LoadingUpdate => {
                return Err(ConsoleError::invalid_state(format!(
                    "{} {} has not loaded yet",
                    self.entity,
                    self.target_id.unwrap_or_default()
                )));
            }
            Phase::CreateMode | Phase::Ready => {}
        }

        if let Err(errors) = self.form.validate() {
            self.form.mark_all_touched();
            tracing::debug!(entity = %self.entity, errors = errors.len(), "submit rejected by validation");
            return Ok(SubmitPlan::Rejected(errors));
        }

        let action = SubmitAction::from(self.mode);
        let draft = self.build_draft(action)?;
        let id = self.target_id.unwrap_or(self.settings.default_probe_id);

        let call = match self.verb(action) {
            Some(Operation::Create) => GatewayCall::Create(draft),
            Some(Operation::UpdatePartial) => GatewayCall::UpdatePartial { id, changes: draft },
            Some(Operation::UpdateFull) => {
                let record = draft.into_record(id).ok_or_else(|| {
                    ConsoleError::invalid_state(format!("{} cannot be edited", self.entity))
                })?;
                GatewayCall::UpdateFull(record)
            }
            Some(other) => {
                return Err(ConsoleError::invalid_state(format!(
                    "{other} is not a submit verb"
                )));
            }
            None if self.settings.strict_capabilities => {
                return Err(ConsoleError::CapabilityAbsent {
                    entity: self.entity,
                    action,
                });
            }
            None => {
                tracing::warn!(entity = %self.entity, %action, "no gateway alias available; submitting as no-op");
                GatewayCall::NoOp
            }
        };
        Ok(SubmitPlan::Dispatch(call))
    }

    fn mount(&mut self, signal: IdentifierSignal) -> Vec<Effect> {
        if self.phase != Phase::Init {
            tracing::warn!(entity = %self.entity, "session already mounted");
            return Vec::new();
        }
        let signal = match signal {
            IdentifierSignal::Absent
                if self.capabilities.supports(self.entity, Operation::FetchById) =>
            {
                IdentifierSignal::Id(self.settings.default_probe_id)
            }
            IdentifierSignal::Absent => IdentifierSignal::New,
            other => other,
        };
        let effects = self.apply_signal(signal);
        tracing::info!(
            entity = %self.entity,
            mode = ?self.mode,
            target_id = ?self.target_id,
            "edit session mounted"
        );
        effects
    }

    /// Last applied signal wins.
    fn apply_signal(&mut self, signal: IdentifierSignal) -> Vec<Effect> {
        tracing::debug!(entity = %self.entity, ?signal, "applying identifier signal");
        match signal {
            IdentifierSignal::Absent => Vec::new(),
            IdentifierSignal::New => {
                self.set_mode(Mode::Create);
                self.phase = Phase::CreateMode;
                Vec::new()
            }
            IdentifierSignal::Id(id) => {
                self.set_mode(Mode::Update);
                self.target_id = Some(id);
                if self.capabilities.supports(self.entity, Operation::FetchById) {
                    self.phase = Phase::LoadingUpdate;
                    vec![Effect::Fetch { id }]
                } else {
                    tracing::warn!(entity = %self.entity, id, "cannot fetch by id; editing without a loaded record");
                    self.phase = Phase::Ready;
                    Vec::new()
                }
            }
        }
    }

    fn apply_load(&mut self, id: i64, record: Option<Record>) -> Vec<Effect> {
        if self.mode != Mode::Update || self.target_id != Some(id) {
            tracing::debug!(entity = %self.entity, id, "discarding stale load");
            return Vec::new();
        }
        let Some(record) = record else {
            tracing::debug!(entity = %self.entity, id, "no record returned; still loading");
            return Vec::new();
        };
        if record.kind() != self.entity {
            tracing::warn!(entity = %self.entity, got = %record.kind(), "ignoring load of wrong entity type");
            return Vec::new();
        }

        self.patch_form(&record);
        self.loaded = Some(record);
        self.phase = Phase::Ready;
        Vec::new()
    }

    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.title = title_for(mode, self.entity);
    }

    fn patch_form(&mut self, record: &Record) {
        match record {
            Record::Customer(c) => self.form.patch([
                ("name", FieldValue::text(c.name.as_str())),
                ("email", FieldValue::text(c.email.as_str())),
                ("username", FieldValue::text(c.username.as_str())),
                ("role", FieldValue::text(c.role.as_str())),
            ]),
            Record::Account(a) => self.form.patch([
                ("customer", FieldValue::Integer(a.customer.get())),
                ("balance", FieldValue::Number(a.balance)),
            ]),
            Record::Transaction(_) => {}
        }
    }

    /// Resolved once per session and action.
    fn verb(&mut self, action: SubmitAction) -> Option<Operation> {
        if let Some(op) = self.verbs.get(&action) {
            return *op;
        }
        let op = VerbFallbackChain::for_action(action).resolve(&self.capabilities, self.entity);
        tracing::info!(entity = %self.entity, %action, verb = ?op, "verb selected");
        self.verbs.insert(action, op);
        op
    }

    fn build_draft(&self, action: SubmitAction) -> ConsoleResult<Draft> {
        match self.entity {
            EntityKind::Customer => {
                let password = self.form.text("password");
                let password = match action {
                    SubmitAction::Create if password.is_empty() => {
                        Some(self.settings.default_password.clone())
                    }
                    _ if password.is_empty() => None,
                    _ => Some(password.to_string()),
                };
                Ok(Draft::Customer(CustomerDraft {
                    name: self.form.text("name").to_string(),
                    email: self.form.text("email").to_string(),
                    username: self.form.text("username").to_string(),
                    password,
                    role: self.form.text("role").parse::<Role>().unwrap_or_default(),
                }))
            }
            EntityKind::Account => {
                let customer = match self.form.value("customer") {
                    Some(FieldValue::Integer(id)) => CustomerId::new(*id),
                    _ => return Err(DomainError::validation("customer must be a customer id").into()),
                };
                let balance = match self.form.value("balance") {
                    Some(FieldValue::Number(n)) => *n,
                    Some(FieldValue::Integer(n)) => Decimal::from(*n),
                    _ => return Err(DomainError::validation("balance must be a number").into()),
                };
                Ok(Draft::Account(AccountDraft { customer, balance }))
            }
            EntityKind::Transaction => {
                Err(ConsoleError::invalid_state("transactions have no edit screen"))
            }
        }
    }
}

fn title_for(mode: Mode, entity: EntityKind) -> String {
    match mode {
        Mode::Create => format!("Add {}", entity.label()),
        Mode::Update => format!("Update {}", entity.label()),
    }
}
