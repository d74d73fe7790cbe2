//! Console error model.

use thiserror::Error;

use bankconsole_core::DomainError;
use bankconsole_gateway::{EntityKind, GatewayError};

use crate::verb::SubmitAction;

pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// Errors surfaced to whoever drives an edit screen.
///
/// Validation failures are not errors: a rejected submit is reported through
/// [`SubmitOutcome::Rejected`](crate::SubmitOutcome::Rejected).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    /// A gateway call failed. Never retried.
    #[error("remote call failed: {0}")]
    Remote(#[from] GatewayError),

    /// No alias of the verb exists on this deployment (strict mode only).
    #[error("no {entity} operation available to {action}")]
    CapabilityAbsent {
        entity: EntityKind,
        action: SubmitAction,
    },

    #[error("invalid session state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ConsoleError {
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
