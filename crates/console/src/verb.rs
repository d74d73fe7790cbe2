//! Verb fallback chains.
//!
//! Each logical action maps to a priority-ordered list of gateway aliases.
//! Resolution is a lookup against the gateway's capability descriptor.

use bankconsole_gateway::{EntityKind, GatewayCapabilities, Operation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmitAction {
    Create,
    Update,
}

impl core::fmt::Display for SubmitAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            SubmitAction::Create => "create",
            SubmitAction::Update => "update",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerbFallbackChain {
    candidates: &'static [Operation],
}

impl VerbFallbackChain {
    const CREATE: &'static [Operation] = &[
        Operation::Create,
        Operation::UpdatePartial,
        Operation::UpdateFull,
    ];
    const UPDATE: &'static [Operation] = &[
        Operation::UpdatePartial,
        Operation::UpdateFull,
        Operation::Create,
    ];
    const LISTING: &'static [Operation] = &[Operation::FetchAllAlias, Operation::FetchAll];

    pub fn for_action(action: SubmitAction) -> Self {
        let candidates = match action {
            SubmitAction::Create => Self::CREATE,
            SubmitAction::Update => Self::UPDATE,
        };
        Self { candidates }
    }

    /// Listing: the `list` alias first, then `get-all`.
    pub fn listing() -> Self {
        Self {
            candidates: Self::LISTING,
        }
    }

    pub fn candidates(&self) -> &'static [Operation] {
        self.candidates
    }

    /// First candidate the deployment implements for `entity`.
    pub fn resolve(&self, capabilities: &GatewayCapabilities, entity: EntityKind) -> Option<Operation> {
        self.candidates
            .iter()
            .copied()
            .find(|op| capabilities.supports(entity, *op))
    }
}
