//! Edit-or-create screens for customers and accounts.
//!
//! One screen instance owns one [`EditSession`]. The session is a pure
//! reducer: route signals, load responses and submit responses arrive as
//! [`SessionEvent`]s on a single ordered channel, and the reducer answers
//! with [`Effect`]s that the [`EditSessionController`] executes against the
//! [`EntityGateway`](bankconsole_gateway::EntityGateway).
//!
//! Whatever identifier signal is applied last decides the mode, whether it
//! came from the route snapshot at mount or from a parameter stream later.

pub mod config;
pub mod controller;
pub mod error;
pub mod form;
pub mod navigation;
pub mod route;
pub mod session;
pub mod verb;

pub use config::ConsoleConfig;
pub use controller::{EditSessionController, SubmitOutcome};
pub use error::{ConsoleError, ConsoleResult};
pub use form::{Constraint, FieldError, FieldKind, FieldValue, FormBuffer};
pub use navigation::{Navigator, RecordingNavigator, TracingNavigator};
pub use route::{IdentifierSignal, ParamMap, RouteSnapshot, RouteSource, RouteSubscriptions};
pub use session::{
    Effect, EditSession, GatewayCall, Mode, Phase, SessionEvent, SessionSettings, SubmitPlan,
};
pub use verb::{SubmitAction, VerbFallbackChain};
