//! Entity trait: identity + continuity across edits.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier, if the backend has assigned one yet.
    fn id(&self) -> Option<Self::Id>;
}
