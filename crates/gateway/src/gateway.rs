//! The Entity Gateway boundary.

use async_trait::async_trait;

use crate::capability::{EntityKind, GatewayCapabilities};
use crate::error::GatewayResult;
use crate::record::{Draft, Record};

/// Uniform CRUD-style client over the banking backend.
///
/// Every call is a one-shot eventual result. Implementations return
/// [`GatewayError::CapabilityAbsent`](crate::GatewayError::CapabilityAbsent)
/// for operations missing from [`capabilities`](Self::capabilities); callers
/// are expected to consult the descriptor first.
#[async_trait]
pub trait EntityGateway: Send + Sync {
    fn capabilities(&self) -> &GatewayCapabilities;

    /// `add`: create a record from a draft.
    async fn create(&self, draft: Draft) -> GatewayResult<Record>;

    /// `get-all`.
    async fn fetch_all(&self, entity: EntityKind) -> GatewayResult<Vec<Record>>;

    /// `list`: same listing under its later alias.
    async fn fetch_all_alias(&self, entity: EntityKind) -> GatewayResult<Vec<Record>>;

    /// `get`: `Ok(None)` when the backend has no such record.
    async fn fetch_by_id(&self, entity: EntityKind, id: i64) -> GatewayResult<Option<Record>>;

    /// `update`: partial update of record `id`.
    async fn update_partial(&self, id: i64, changes: Draft) -> GatewayResult<Record>;

    /// `edit`: full-object update; the record carries its own id.
    async fn update_full(&self, record: Record) -> GatewayResult<Record>;

    async fn delete(&self, entity: EntityKind, id: i64) -> GatewayResult<()>;
}
