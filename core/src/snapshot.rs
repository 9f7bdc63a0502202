//! Snapshot identity.
//!
//! The Store decides whether a transition changed anything by comparing the
//! snapshot before and after the reducer ran. Comparison is by identity, not
//! by value: a reducer that rebuilt an equal record still counts as a change.

use std::sync::Arc;

/// Identity comparison between two snapshots of the same state.
pub trait Snapshot: Clone {
    /// Returns `true` if `other` is the very same snapshot as `self`.
    fn same_snapshot(&self, other: &Self) -> bool;
}

impl<T: ?Sized> Snapshot for Arc<T> {
    fn same_snapshot(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}
