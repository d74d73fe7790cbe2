//! Edit screen driver.
//!
//! The controller owns an [`EditSession`] and executes the effects it asks
//! for. Route emissions and gateway responses all arrive on one channel and
//! are applied in arrival order, so the session only ever sees one event at a
//! time.

use std::sync::Arc;

use tokio::sync::mpsc;

use bankconsole_gateway::{
    EntityGateway, EntityKind, GatewayError, GatewayResult, Operation, Record,
};

use crate::error::{ConsoleError, ConsoleResult};
use crate::form::{FieldError, FieldValue};
use crate::navigation::Navigator;
use crate::route::{self, IdentifierSignal, RouteSource, RouteSubscriptions};
use crate::session::{Effect, EditSession, GatewayCall, SessionEvent, SessionSettings, SubmitPlan};

/// Result of [`EditSessionController::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing was sent; the listed fields fail validation.
    Rejected(Vec<FieldError>),
    /// The call is in flight. Its completion is observed through
    /// [`next_event`](EditSessionController::next_event) or
    /// [`settle`](EditSessionController::settle).
    Dispatched,
}

enum Inbound {
    Route(IdentifierSignal),
    Loaded {
        id: i64,
        result: GatewayResult<Option<Record>>,
    },
    Options(GatewayResult<Vec<Record>>),
    Submitted(GatewayResult<Option<Record>>),
}

pub struct EditSessionController {
    session: EditSession,
    gateway: Arc<dyn EntityGateway>,
    navigator: Arc<dyn Navigator>,
    tx: mpsc::UnboundedSender<Inbound>,
    rx: mpsc::UnboundedReceiver<Inbound>,
    subscriptions: Option<RouteSubscriptions>,
    mounted: bool,
    torn_down: bool,
    /// Gateway calls whose response has not been applied yet.
    in_flight: usize,
    submits_in_flight: usize,
}

impl EditSessionController {
    /// Capabilities are read from the gateway once, here.
    pub fn new(
        entity: EntityKind,
        gateway: Arc<dyn EntityGateway>,
        navigator: Arc<dyn Navigator>,
        settings: SessionSettings,
    ) -> ConsoleResult<Self> {
        let session = EditSession::new(entity, gateway.capabilities().clone(), settings)?;
        let (tx, rx) = mpsc::unbounded_channel();
        Ok(Self {
            session,
            gateway,
            navigator,
            tx,
            rx,
            subscriptions: None,
            mounted: false,
            torn_down: false,
            in_flight: 0,
            submits_in_flight: 0,
        })
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted && !self.torn_down
    }

    /// Gateway calls still outstanding.
    pub fn pending(&self) -> usize {
        self.in_flight
    }

    /// Resolve the identifier synchronously, then subscribe to the route's
    /// parameter streams. Must run inside a tokio runtime.
    pub fn mount(&mut self, route: Option<RouteSource>) -> ConsoleResult<()> {
        if self.mounted {
            return Err(ConsoleError::invalid_state("edit screen is already mounted"));
        }
        self.mounted = true;

        let signal = route::resolve_sync(route.as_ref());
        let effects = self.session.handle(SessionEvent::Mounted(signal));
        self.run(effects);

        if let Some(mut route) = route {
            let tx = self.tx.clone();
            let subscriptions = route.subscribe_async(move |signal| {
                let _ = tx.send(Inbound::Route(signal));
            });
            tracing::debug!(streams = subscriptions.len(), "route subscriptions active");
            self.subscriptions = Some(subscriptions);
        }
        Ok(())
    }

    /// Release route subscriptions. Later route emissions are ignored;
    /// responses of calls already sent are still applied.
    pub fn unmount(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        if let Some(mut subscriptions) = self.subscriptions.take() {
            subscriptions.release();
        }
        if self.mounted {
            tracing::info!(entity = %self.session.entity(), "edit screen unmounted");
        }
    }

    /// Fetch the customers an account may be assigned to.
    pub fn load_customer_options(&mut self) -> ConsoleResult<()> {
        if self.session.entity() != EntityKind::Account {
            return Err(ConsoleError::invalid_state(
                "customer options only exist on account screens",
            ));
        }
        match self.session.options_request() {
            Some(effect) => self.run(vec![effect]),
            None => {
                tracing::warn!("no customer listing available; selector stays empty");
                let effects = self.session.handle(SessionEvent::OptionsLoaded(Vec::new()));
                self.run(effects);
            }
        }
        Ok(())
    }

    pub fn set_field(&mut self, name: &str, value: FieldValue) -> ConsoleResult<()> {
        self.session.form_mut().set(name, value)?;
        Ok(())
    }

    pub fn set_input(&mut self, name: &str, raw: &str) -> ConsoleResult<()> {
        self.session.form_mut().set_input(name, raw)?;
        Ok(())
    }

    /// Validate the form and, if it passes, dispatch the resolved verb.
    pub fn submit(&mut self) -> ConsoleResult<SubmitOutcome> {
        if self.torn_down {
            return Err(ConsoleError::invalid_state("edit screen is unmounted"));
        }
        match self.session.plan_submit()? {
            SubmitPlan::Rejected(errors) => Ok(SubmitOutcome::Rejected(errors)),
            SubmitPlan::Dispatch(call) => {
                if self.submits_in_flight > 0 {
                    tracing::warn!(
                        entity = %self.session.entity(),
                        in_flight = self.submits_in_flight,
                        "submitting while a previous submit is still in flight"
                    );
                }
                self.submits_in_flight += 1;
                self.run(vec![Effect::Invoke(call)]);
                Ok(SubmitOutcome::Dispatched)
            }
        }
    }

    /// Wait for and apply the next inbound message.
    ///
    /// Returns `None` when nothing is outstanding and no route stream can
    /// still emit. A failed gateway call is returned as `Some(Err(..))`.
    pub async fn next_event(&mut self) -> Option<ConsoleResult<()>> {
        let message = if self.in_flight > 0 {
            self.rx.recv().await?
        } else if self.routes_live() {
            let subscriptions = self.subscriptions.as_mut()?;
            let received = tokio::select! {
                message = self.rx.recv() => message,
                () = subscriptions.closed() => None,
            };
            match received {
                Some(message) => message,
                // Signals forwarded just before the streams ended.
                None => self.rx.try_recv().ok()?,
            }
        } else {
            self.rx.try_recv().ok()?
        };
        Some(self.apply(message))
    }

    /// Apply everything already queued, then wait until no gateway call is
    /// outstanding. Returns the first failure, after draining the rest.
    pub async fn settle(&mut self) -> ConsoleResult<()> {
        let mut first_error = None;
        loop {
            while let Ok(message) = self.rx.try_recv() {
                if let Err(err) = self.apply(message) {
                    first_error.get_or_insert(err);
                }
            }
            if self.in_flight == 0 {
                break;
            }
            let Some(message) = self.rx.recv().await else {
                break;
            };
            if let Err(err) = self.apply(message) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn routes_live(&self) -> bool {
        !self.torn_down
            && self
                .subscriptions
                .as_ref()
                .is_some_and(RouteSubscriptions::is_active)
    }

    fn apply(&mut self, message: Inbound) -> ConsoleResult<()> {
        let event = match message {
            Inbound::Route(signal) => {
                if self.torn_down {
                    tracing::debug!(?signal, "route emission after unmount ignored");
                    return Ok(());
                }
                SessionEvent::RouteSignal(signal)
            }
            Inbound::Loaded { id, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                SessionEvent::Loaded {
                    id,
                    record: self.check("fetch", result)?,
                }
            }
            Inbound::Options(result) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                SessionEvent::OptionsLoaded(self.check("list customers", result)?)
            }
            Inbound::Submitted(result) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.submits_in_flight = self.submits_in_flight.saturating_sub(1);
                SessionEvent::Submitted(self.check("submit", result)?)
            }
        };
        let effects = self.session.handle(event);
        self.run(effects);
        Ok(())
    }

    fn check<T>(&self, what: &str, result: GatewayResult<T>) -> ConsoleResult<T> {
        result.map_err(|err| {
            tracing::warn!(entity = %self.session.entity(), error = %err, "{what} failed");
            ConsoleError::Remote(err)
        })
    }

    fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Navigate(path) => self.navigator.navigate(&path),
                Effect::Fetch { id } => {
                    let entity = self.session.entity();
                    self.spawn(move |gateway| async move {
                        let result = gateway.fetch_by_id(entity, id).await;
                        Inbound::Loaded { id, result }
                    });
                }
                Effect::List { entity, operation } => {
                    self.spawn(move |gateway| async move {
                        let result = match operation {
                            Operation::FetchAllAlias => gateway.fetch_all_alias(entity).await,
                            Operation::FetchAll => gateway.fetch_all(entity).await,
                            other => Err(GatewayError::InvalidRequest(format!(
                                "{other} is not a listing operation"
                            ))),
                        };
                        Inbound::Options(result)
                    });
                }
                Effect::Invoke(GatewayCall::NoOp) => {
                    self.in_flight += 1;
                    let _ = self.tx.send(Inbound::Submitted(Ok(None)));
                }
                Effect::Invoke(call) => {
                    self.spawn(move |gateway| async move {
                        let result = match call {
                            GatewayCall::Create(draft) => gateway.create(draft).await.map(Some),
                            GatewayCall::UpdatePartial { id, changes } => {
                                gateway.update_partial(id, changes).await.map(Some)
                            }
                            GatewayCall::UpdateFull(record) => {
                                gateway.update_full(record).await.map(Some)
                            }
                            GatewayCall::NoOp => Ok(None),
                        };
                        Inbound::Submitted(result)
                    });
                }
            }
        }
    }

    fn spawn<F, Fut>(&mut self, call: F)
    where
        F: FnOnce(Arc<dyn EntityGateway>) -> Fut,
        Fut: Future<Output = Inbound> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.tx.clone();
        let task = call(self.gateway.clone());
        tokio::spawn(async move {
            let _ = tx.send(task.await);
        });
    }
}

impl Drop for EditSessionController {
    fn drop(&mut self) {
        self.unmount();
    }
}
