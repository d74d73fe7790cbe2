//! Uniform client over the banking backend.
//!
//! The backend has grown several names for the same logical operation
//! (`edit` vs `update`, `getAll` vs its later alias). Every deployment
//! advertises which of them it implements through a [`GatewayCapabilities`]
//! descriptor fixed at construction; callers branch on that descriptor
//! instead of probing at call time.
//!
//! - [`HttpGateway`]: reqwest-backed REST client
//! - [`InMemoryGateway`]: seeded store for tests/dev, records every call

pub mod capability;
pub mod error;
pub mod gateway;
pub mod http;
pub mod memory;
pub mod record;

pub use capability::{Capability, EntityKind, GatewayCapabilities, Operation};
pub use error::{GatewayError, GatewayResult};
pub use gateway::EntityGateway;
pub use http::HttpGateway;
pub use memory::{InMemoryGateway, RecordedCall};
pub use record::{Draft, Record};
