//! `bank-console <customer|account> <id|new|-> [field=value ...]`
//!
//! Opens one edit screen against the configured backend, applies the given
//! field values and submits. `-` mounts without route context.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use bankconsole_console::{
    ConsoleConfig, EditSessionController, RecordingNavigator, RouteSnapshot, RouteSource,
    SubmitOutcome,
};
use bankconsole_gateway::EntityKind;

#[derive(Parser, Debug)]
#[command(name = "bank-console", version, about = "Edit or create a customer or account")]
struct Cli {
    /// Which edit screen to open
    #[arg(value_enum)]
    screen: Screen,

    /// Record id, `new`, or `-` for no route context
    target: String,

    /// Field values applied before submitting
    #[arg(value_name = "FIELD=VALUE", value_parser = parse_assignment)]
    assignments: Vec<(String, String)>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Screen {
    Customer,
    Account,
}

impl From<Screen> for EntityKind {
    fn from(screen: Screen) -> Self {
        match screen {
            Screen::Customer => EntityKind::Customer,
            Screen::Account => EntityKind::Account,
        }
    }
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected FIELD=VALUE, got {raw:?}")),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    bankconsole_observability::init();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "bank-console failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let entity = EntityKind::from(cli.screen);
    let target = cli.target;
    let assignments = cli.assignments;

    let config = ConsoleConfig::from_env().context("loading configuration")?;
    tracing::info!(api_url = %config.api_url, %entity, target = %target, "opening edit screen");

    let gateway = Arc::new(config.http_gateway());
    let navigator = Arc::new(RecordingNavigator::default());
    let mut controller = EditSessionController::new(
        entity,
        gateway,
        navigator.clone(),
        config.session_settings(),
    )?;

    let route = (target != "-")
        .then(|| RouteSource::new().with_snapshot(RouteSnapshot::with_id(target.as_str())));
    controller.mount(route)?;
    controller.settle().await.context("loading record")?;

    if entity == EntityKind::Account {
        controller.load_customer_options()?;
        controller.settle().await.context("loading customers")?;
        tracing::info!(
            customers = controller.session().customer_options().len(),
            "customer options loaded"
        );
    }

    for (field, value) in &assignments {
        controller
            .set_input(field, value)
            .with_context(|| format!("setting {field}"))?;
    }

    if let SubmitOutcome::Rejected(errors) = controller.submit()? {
        for error in &errors {
            eprintln!("invalid: {error}");
        }
        return Ok(ExitCode::from(2));
    }
    controller.settle().await.context("submitting")?;

    let session = controller.session();
    println!("{}", session.last_outcome_message());
    if let Some(path) = navigator.last() {
        println!("-> {path}");
    }
    if let Some(record) = session.loaded_entity() {
        println!("{}", serde_json::to_string_pretty(record)?);
    }
    controller.unmount();
    Ok(ExitCode::SUCCESS)
}
