//! Entity trait: rows with a stable identity.

/// A persisted row identified by a store-assigned id.
///
/// Profile rows keep their id for life; only `marks` on a student row ever changes.
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
