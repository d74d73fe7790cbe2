//! Edit screens driven end to end against the in-memory gateway.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use rust_decimal::Decimal;
use tokio::sync::mpsc;

use bankconsole_accounts::{Account, Customer, Role};
use bankconsole_console::{
    ConsoleError, EditSessionController, FieldValue, IdentifierSignal, Mode, ParamMap, Phase,
    RecordingNavigator, RouteSnapshot, RouteSource, SessionSettings, SubmitAction, SubmitOutcome,
};
use bankconsole_core::CustomerId;
use bankconsole_gateway::{
    Capability, EntityKind, GatewayCapabilities, GatewayError, InMemoryGateway, Operation, Record,
};

const CUSTOMER: EntityKind = EntityKind::Customer;
const ACCOUNT: EntityKind = EntityKind::Account;

fn customer(name: &str) -> Customer {
    Customer {
        customer_id: None,
        name: name.into(),
        email: format!("{}@example.com", name.to_lowercase()),
        username: name.to_lowercase(),
        password: Some("s3cret!".into()),
        role: Role::User,
    }
}

fn account(owner: i64, balance: i64) -> Account {
    Account {
        account_id: None,
        customer: CustomerId::new(owner),
        balance: Decimal::from(balance),
    }
}

struct Screen {
    controller: EditSessionController,
    gateway: Arc<InMemoryGateway>,
    navigator: Arc<RecordingNavigator>,
}

fn screen(entity: EntityKind, gateway: InMemoryGateway) -> Screen {
    screen_with(entity, gateway, SessionSettings::default())
}

fn screen_with(entity: EntityKind, gateway: InMemoryGateway, settings: SessionSettings) -> Screen {
    let gateway = Arc::new(gateway);
    let navigator = Arc::new(RecordingNavigator::default());
    let controller =
        EditSessionController::new(entity, gateway.clone(), navigator.clone(), settings).unwrap();
    Screen {
        controller,
        gateway,
        navigator,
    }
}

fn route(id: &str) -> RouteSource {
    RouteSource::new().with_snapshot(RouteSnapshot::with_id(id))
}

fn params(id: &str) -> ParamMap {
    let mut map = ParamMap::new();
    map.insert("id".into(), id.into());
    map
}

fn fetches(gateway: &InMemoryGateway, entity: EntityKind) -> usize {
    gateway.calls_to(entity, Operation::FetchById).len()
}

fn fill_customer(controller: &mut EditSessionController, name: &str) {
    controller.set_input("name", name).unwrap();
    controller
        .set_input("email", &format!("{}@example.com", name.to_lowercase()))
        .unwrap();
    controller.set_input("username", &name.to_lowercase()).unwrap();
}

proptest! {
    #[test]
    fn mounting_with_an_id_fetches_it_exactly_once(id in 1i64..100_000) {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        rt.block_on(async {
            let mut s = screen(CUSTOMER, InMemoryGateway::default());
            s.controller.mount(Some(route(&id.to_string()))).unwrap();
            s.controller.settle().await.unwrap();

            let session = s.controller.session();
            assert_eq!(session.mode(), Mode::Update);
            assert_eq!(session.title(), "Update Customer");
            assert_eq!(session.target_id(), Some(id));
            let calls = s.gateway.calls();
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].id, Some(id));
        });
    }
}

#[tokio::test]
async fn mounting_new_makes_no_calls() {
    for entity in [CUSTOMER, ACCOUNT] {
        let mut s = screen(entity, InMemoryGateway::default());
        s.controller.mount(Some(route("new"))).unwrap();
        s.controller.settle().await.unwrap();

        let session = s.controller.session();
        assert_eq!(session.mode(), Mode::Create);
        assert_eq!(session.phase(), Phase::CreateMode);
        assert_eq!(session.title(), format!("Add {}", entity.label()));
        assert!(s.gateway.calls().is_empty());
    }
}

#[tokio::test]
async fn mounting_without_route_probes_the_default_id() {
    let seeded = || InMemoryGateway::default().with_customer(customer("Ada"));

    let mut probed = screen(CUSTOMER, seeded());
    probed.controller.mount(None).unwrap();
    probed.controller.settle().await.unwrap();

    let mut explicit = screen(CUSTOMER, seeded());
    explicit.controller.mount(Some(route("1"))).unwrap();
    explicit.controller.settle().await.unwrap();

    let (a, b) = (probed.controller.session(), explicit.controller.session());
    assert_eq!(a.mode(), b.mode());
    assert_eq!(a.phase(), Phase::Ready);
    assert_eq!(a.target_id(), b.target_id());
    assert_eq!(a.loaded_entity(), b.loaded_entity());
    assert_eq!(a.form(), b.form());
    assert_eq!(probed.gateway.calls(), explicit.gateway.calls());
}

#[tokio::test]
async fn mounting_without_route_or_fetch_capability_creates() {
    let caps = GatewayCapabilities::all().without(ACCOUNT, Operation::FetchById);
    let mut s = screen(ACCOUNT, InMemoryGateway::new(caps));
    s.controller.mount(None).unwrap();
    s.controller.settle().await.unwrap();

    assert_eq!(s.controller.session().mode(), Mode::Create);
    assert_eq!(s.controller.session().title(), "Add Account");
    assert!(s.gateway.calls().is_empty());
}

#[tokio::test]
async fn mounting_twice_is_rejected() {
    let mut s = screen(CUSTOMER, InMemoryGateway::default());
    s.controller.mount(Some(route("new"))).unwrap();
    assert!(matches!(
        s.controller.mount(Some(route("new"))),
        Err(ConsoleError::InvalidState(_))
    ));
}

#[tokio::test]
async fn late_route_signal_switches_target() {
    let gateway = InMemoryGateway::default()
        .with_customer(customer("Ada"))
        .with_customer(customer("Grace"));
    let mut s = screen(CUSTOMER, gateway);
    let (tx, rx) = mpsc::unbounded_channel();
    s.controller
        .mount(Some(route("new").with_params_stream(rx)))
        .unwrap();
    assert_eq!(s.controller.session().mode(), Mode::Create);

    tx.send(params("2")).unwrap();
    s.controller.next_event().await.unwrap().unwrap();
    s.controller.settle().await.unwrap();

    let session = s.controller.session();
    assert_eq!(session.mode(), Mode::Update);
    assert_eq!(session.title(), "Update Customer");
    assert_eq!(session.form().text("name"), "Grace");
    assert_eq!(fetches(&s.gateway, CUSTOMER), 1);
}

#[tokio::test]
async fn reapplying_the_same_id_is_idempotent() {
    let gateway = InMemoryGateway::default().with_customer(customer("Ada"));
    let mut s = screen(CUSTOMER, gateway);
    let (tx, rx) = mpsc::unbounded_channel();
    s.controller
        .mount(Some(route("1").with_param_map_stream(rx)))
        .unwrap();
    s.controller.settle().await.unwrap();
    let before = s.controller.session().clone();

    tx.send(params("1")).unwrap();
    s.controller.next_event().await.unwrap().unwrap();
    s.controller.settle().await.unwrap();

    let after = s.controller.session();
    assert_eq!(after.mode(), before.mode());
    assert_eq!(after.phase(), before.phase());
    assert_eq!(after.target_id(), before.target_id());
    assert_eq!(after.loaded_entity(), before.loaded_entity());
    assert_eq!(after.form(), before.form());
}

#[tokio::test]
async fn late_response_for_a_replaced_target_is_discarded() {
    let gateway = InMemoryGateway::default()
        .with_customer(customer("Ada"))
        .with_customer(customer("Grace"))
        .delay_fetch(1, Duration::from_millis(50));
    let mut s = screen(CUSTOMER, gateway);
    let (tx, rx) = mpsc::unbounded_channel();
    s.controller
        .mount(Some(route("1").with_param_map_stream(rx)))
        .unwrap();

    tx.send(params("2")).unwrap();
    s.controller.next_event().await.unwrap().unwrap();
    s.controller.settle().await.unwrap();

    let session = s.controller.session();
    assert_eq!(session.target_id(), Some(2));
    assert_eq!(session.form().text("name"), "Grace");
    assert_eq!(session.loaded_entity().and_then(Record::id), Some(2));
    assert_eq!(fetches(&s.gateway, CUSTOMER), 2);
}

#[tokio::test]
async fn invalid_customer_form_sends_nothing() {
    let mut s = screen(CUSTOMER, InMemoryGateway::default());
    s.controller.mount(Some(route("new"))).unwrap();
    fill_customer(&mut s.controller, "Ada");
    s.controller.set_input("name", "").unwrap();

    let SubmitOutcome::Rejected(errors) = s.controller.submit().unwrap() else {
        panic!("empty name must be rejected");
    };
    assert!(errors.iter().any(|e| e.field == "name"));
    assert!(s.controller.session().form().all_touched());

    s.controller.settle().await.unwrap();
    assert!(s.gateway.calls().is_empty());
    assert!(s.navigator.history().is_empty());
}

#[tokio::test]
async fn account_without_customer_sends_nothing() {
    let mut s = screen(ACCOUNT, InMemoryGateway::default());
    s.controller.mount(Some(route("new"))).unwrap();
    s.controller.set_input("balance", "10").unwrap();

    let SubmitOutcome::Rejected(errors) = s.controller.submit().unwrap() else {
        panic!("missing customer must be rejected");
    };
    assert!(errors.iter().any(|e| e.field == "customer"));
    assert!(s.controller.session().form().all_touched());
    s.controller.settle().await.unwrap();
    assert!(s.gateway.calls().is_empty());
}

#[tokio::test]
async fn update_through_full_replace_merges_the_stored_id() {
    let caps = GatewayCapabilities::none().with(CUSTOMER, Operation::UpdateFull);
    let mut s = screen(CUSTOMER, InMemoryGateway::new(caps));
    s.controller.mount(Some(route("7"))).unwrap();
    assert_eq!(s.controller.session().mode(), Mode::Update);

    fill_customer(&mut s.controller, "Grace");
    assert_eq!(s.controller.submit().unwrap(), SubmitOutcome::Dispatched);
    s.controller.settle().await.unwrap();

    let calls = s.gateway.calls_to(CUSTOMER, Operation::UpdateFull);
    assert_eq!(calls.len(), 1);
    let body = calls[0].body.as_ref().unwrap();
    assert_eq!(body["customerId"], 7);
    assert_eq!(body["name"], "Grace");
    assert_eq!(body.get("password"), None);

    assert_eq!(
        s.controller.session().last_outcome_message(),
        "Customer updated successfully"
    );
    assert_eq!(s.navigator.history(), vec!["/bank".to_string()]);
}

#[tokio::test]
async fn create_through_the_only_verb_present() {
    let caps = GatewayCapabilities::none().with(ACCOUNT, Operation::Create);
    let mut s = screen(ACCOUNT, InMemoryGateway::new(caps));
    s.controller.mount(Some(route("new"))).unwrap();
    s.controller.set_input("customer", "3").unwrap();
    s.controller.set_input("balance", "250.75").unwrap();

    assert_eq!(s.controller.submit().unwrap(), SubmitOutcome::Dispatched);
    s.controller.settle().await.unwrap();

    let calls = s.gateway.calls_to(ACCOUNT, Operation::Create);
    assert_eq!(calls.len(), 1);
    let body = calls[0].body.as_ref().unwrap();
    assert_eq!(body["customer"], 3);
    assert_eq!(body["balance"], 250.75);

    let session = s.controller.session();
    assert_eq!(session.last_outcome_message(), "Account updated successfully");
    assert_eq!(session.resolved_verb(SubmitAction::Create), Some(Some(Operation::Create)));
    assert_eq!(s.navigator.last().as_deref(), Some("/bank"));
}

#[tokio::test]
async fn customer_create_fills_in_the_default_password() {
    let mut s = screen(CUSTOMER, InMemoryGateway::default());
    s.controller.mount(Some(route("new"))).unwrap();
    fill_customer(&mut s.controller, "Ada");
    s.controller.submit().unwrap();
    s.controller.settle().await.unwrap();

    let calls = s.gateway.calls_to(CUSTOMER, Operation::Create);
    let body = calls[0].body.as_ref().unwrap();
    assert_eq!(body["password"], "Password@123");
    assert_eq!(body["role"], "User");
}

#[tokio::test]
async fn partial_update_keeps_the_stored_password() {
    let gateway = InMemoryGateway::default().with_customer(customer("Ada"));
    let mut s = screen(CUSTOMER, gateway);
    s.controller.mount(Some(route("1"))).unwrap();
    s.controller.settle().await.unwrap();
    assert_eq!(s.controller.session().form().text("password"), "");

    s.controller.set_input("role", "Admin").unwrap();
    s.controller.submit().unwrap();
    s.controller.settle().await.unwrap();

    let calls = s.gateway.calls_to(CUSTOMER, Operation::UpdatePartial);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].id, Some(1));
    assert_eq!(calls[0].body.as_ref().unwrap().get("password"), None);

    let Some(Record::Customer(stored)) = s.gateway.get(CUSTOMER, 1) else {
        panic!("customer 1 must still exist");
    };
    assert_eq!(stored.role, Role::Admin);
    assert_eq!(stored.password.as_deref(), Some("s3cret!"));
}

#[tokio::test]
async fn exhausted_chain_succeeds_without_a_request() {
    let mut s = screen(CUSTOMER, InMemoryGateway::new(GatewayCapabilities::none()));
    s.controller.mount(Some(route("new"))).unwrap();
    fill_customer(&mut s.controller, "Ada");

    assert_eq!(s.controller.submit().unwrap(), SubmitOutcome::Dispatched);
    s.controller.settle().await.unwrap();

    assert!(s.gateway.calls().is_empty());
    let session = s.controller.session();
    assert_eq!(session.last_outcome_message(), "Customer updated successfully");
    assert!(session.loaded_entity().is_none());
    assert_eq!(s.navigator.history(), vec!["/bank".to_string()]);
}

#[tokio::test]
async fn strict_mode_reports_the_missing_capability() {
    let settings = SessionSettings {
        strict_capabilities: true,
        ..SessionSettings::default()
    };
    let mut s = screen_with(
        CUSTOMER,
        InMemoryGateway::new(GatewayCapabilities::none()),
        settings,
    );
    s.controller.mount(Some(route("new"))).unwrap();
    fill_customer(&mut s.controller, "Ada");

    assert_eq!(
        s.controller.submit().unwrap_err(),
        ConsoleError::CapabilityAbsent {
            entity: CUSTOMER,
            action: SubmitAction::Create,
        }
    );
    assert!(s.navigator.history().is_empty());
}

#[tokio::test]
async fn failed_submit_surfaces_and_does_not_navigate() {
    let failure = GatewayError::Api(500, "boom".into());
    let gateway = InMemoryGateway::default()
        .with_customer(customer("Ada"))
        .fail_on(Capability::new(CUSTOMER, Operation::UpdatePartial), failure.clone());
    let mut s = screen(CUSTOMER, gateway);
    s.controller.mount(Some(route("1"))).unwrap();
    s.controller.settle().await.unwrap();

    s.controller.submit().unwrap();
    assert_eq!(
        s.controller.settle().await,
        Err(ConsoleError::Remote(failure))
    );
    assert_eq!(s.controller.session().last_outcome_message(), "");
    assert!(s.navigator.history().is_empty());
    // No retry.
    assert_eq!(s.gateway.calls_to(CUSTOMER, Operation::UpdatePartial).len(), 1);
}

#[tokio::test]
async fn failed_load_leaves_the_screen_loading() {
    let gateway = InMemoryGateway::default().fail_on(
        Capability::new(ACCOUNT, Operation::FetchById),
        GatewayError::Network("connection refused".into()),
    );
    let mut s = screen(ACCOUNT, gateway);
    s.controller.mount(Some(route("4"))).unwrap();

    assert!(matches!(
        s.controller.settle().await,
        Err(ConsoleError::Remote(GatewayError::Network(_)))
    ));
    assert_eq!(s.controller.session().phase(), Phase::LoadingUpdate);
    assert!(matches!(
        s.controller.submit(),
        Err(ConsoleError::InvalidState(_))
    ));
}

#[tokio::test]
async fn missing_record_keeps_waiting_for_a_load() {
    let mut s = screen(CUSTOMER, InMemoryGateway::default());
    s.controller.mount(Some(route("42"))).unwrap();
    s.controller.settle().await.unwrap();

    assert_eq!(s.controller.session().phase(), Phase::LoadingUpdate);
    assert!(s.controller.session().loaded_entity().is_none());
}

#[tokio::test]
async fn second_submit_is_sent_as_well() {
    let mut s = screen(CUSTOMER, InMemoryGateway::default());
    s.controller.mount(Some(route("new"))).unwrap();
    fill_customer(&mut s.controller, "Ada");

    assert_eq!(s.controller.submit().unwrap(), SubmitOutcome::Dispatched);
    assert_eq!(s.controller.submit().unwrap(), SubmitOutcome::Dispatched);
    s.controller.settle().await.unwrap();

    assert_eq!(s.gateway.calls_to(CUSTOMER, Operation::Create).len(), 2);
    assert_eq!(s.navigator.history().len(), 2);
}

#[tokio::test]
async fn account_screen_loads_customer_options_on_request() {
    let gateway = InMemoryGateway::default()
        .with_customer(customer("Ada"))
        .with_customer(customer("Grace"))
        .with_account(account(1, 100));
    let mut s = screen(ACCOUNT, gateway);
    s.controller.mount(Some(route("3"))).unwrap();
    s.controller.settle().await.unwrap();
    assert!(s.controller.session().customer_options().is_empty());
    assert_eq!(
        s.controller.session().form().value("customer"),
        Some(&FieldValue::Integer(1))
    );

    s.controller.load_customer_options().unwrap();
    s.controller.settle().await.unwrap();

    let names: Vec<_> = s
        .controller
        .session()
        .customer_options()
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, ["Ada", "Grace"]);
    assert_eq!(s.gateway.calls_to(CUSTOMER, Operation::FetchAllAlias).len(), 1);
}

#[tokio::test]
async fn customer_options_fall_back_to_the_plain_listing() {
    let caps = GatewayCapabilities::all().without(CUSTOMER, Operation::FetchAllAlias);
    let gateway = InMemoryGateway::new(caps).with_customer(customer("Ada"));
    let mut s = screen(ACCOUNT, gateway);
    s.controller.mount(Some(route("new"))).unwrap();
    s.controller.load_customer_options().unwrap();
    s.controller.settle().await.unwrap();

    assert_eq!(s.controller.session().customer_options().len(), 1);
    assert_eq!(s.gateway.calls_to(CUSTOMER, Operation::FetchAll).len(), 1);

    let mut customer_screen = screen(CUSTOMER, InMemoryGateway::default());
    customer_screen.controller.mount(Some(route("new"))).unwrap();
    assert!(customer_screen.controller.load_customer_options().is_err());
}

#[tokio::test]
async fn unmounted_screen_ignores_route_emissions() {
    let mut s = screen(CUSTOMER, InMemoryGateway::default());
    let (tx, rx) = mpsc::unbounded_channel();
    s.controller
        .mount(Some(route("new").with_params_stream(rx)))
        .unwrap();
    s.controller.unmount();
    assert!(!s.controller.is_mounted());

    let _ = tx.send(params("5"));
    tokio::task::yield_now().await;
    while let Some(result) = s.controller.next_event().await {
        result.unwrap();
    }

    assert_eq!(s.controller.session().mode(), Mode::Create);
    assert!(s.gateway.calls().is_empty());
    assert!(s.controller.submit().is_err());
}

#[tokio::test]
async fn identifier_signal_of_unparseable_id_creates() {
    let mut s = screen(CUSTOMER, InMemoryGateway::default());
    s.controller.mount(Some(route("abc"))).unwrap();
    assert_eq!(IdentifierSignal::parse(Some("abc")), IdentifierSignal::New);
    assert_eq!(s.controller.session().mode(), Mode::Create);
    assert!(s.gateway.calls().is_empty());
}

#[tokio::test]
async fn event_loop_ends_once_route_streams_close() {
    let gateway = InMemoryGateway::default()
        .with_customer(customer("Ada"))
        .with_customer(customer("Grace"));
    let mut s = screen(CUSTOMER, gateway);
    let (map_tx, map_rx) = mpsc::unbounded_channel();
    let (params_tx, params_rx) = mpsc::unbounded_channel();
    s.controller
        .mount(Some(
            route("new")
                .with_param_map_stream(map_rx)
                .with_params_stream(params_rx),
        ))
        .unwrap();

    params_tx.send(params("2")).unwrap();
    drop(params_tx);
    drop(map_tx);

    let mut applied = 0;
    while let Some(result) = tokio::time::timeout(Duration::from_secs(2), s.controller.next_event())
        .await
        .expect("next_event must return once no stream can emit")
    {
        result.unwrap();
        applied += 1;
    }

    // The route signal, then its load.
    assert_eq!(applied, 2);
    assert_eq!(s.controller.session().target_id(), Some(2));
    assert_eq!(s.controller.session().form().text("name"), "Grace");
}

#[tokio::test]
async fn next_event_is_none_when_streams_closed_without_emitting() {
    let mut s = screen(ACCOUNT, InMemoryGateway::default());
    let (tx, rx) = mpsc::unbounded_channel();
    s.controller
        .mount(Some(route("new").with_params_stream(rx)))
        .unwrap();
    drop(tx);

    let next = tokio::time::timeout(Duration::from_secs(2), s.controller.next_event())
        .await
        .expect("next_event must not hang");
    assert!(next.is_none());
    assert!(s.gateway.calls().is_empty());
}
