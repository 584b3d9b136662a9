//! Persistence seam for sibling order values.
//!
//! The LMS backend owns the real data. This module defines the contract the reorder workflow
//! needs from it ([`OrderStore`]), an in-memory/JSON-file implementation, and the service that
//! drives a move end to end.

pub mod memory;
pub mod reorder;

use crate::entity::{OrderedEntry, SiblingScope};
use crate::reorder::OrderPatch;
use crate::LmsResult;
use lms_types::EntityId;

/// Storage for the `order` field of entities, grouped by sibling scope.
pub trait OrderStore {
    /// All entries in `scope`, in storage order. An unknown scope has no entries.
    fn siblings(&self, scope: &SiblingScope) -> LmsResult<Vec<OrderedEntry>>;

    /// Writes every patch, or none of them.
    ///
    /// Implementations must reject the whole batch if any id is missing from `scope` or
    /// listed twice. A swap written half way would leave two siblings sharing an order.
    fn write_orders(&mut self, scope: &SiblingScope, patches: &[OrderPatch]) -> LmsResult<()>;

    /// Adds a new entity at the end of `scope` and returns its entry.
    fn insert(&mut self, scope: &SiblingScope, id: EntityId) -> LmsResult<OrderedEntry>;

    /// Removes an entity, leaving a gap in the order values.
    fn remove(&mut self, scope: &SiblingScope, id: &EntityId) -> LmsResult<OrderedEntry>;
}
