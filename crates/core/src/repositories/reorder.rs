//! Drives a single up/down move against an [`OrderStore`].

use super::OrderStore;
use crate::entity::{sort_by_order, OrderedEntry, SiblingScope};
use crate::reorder::{plan_swap, Direction, SwapOutcome};
use crate::LmsResult;
use lms_types::EntityId;

/// Loads a scope, plans the swap, and persists both halves in one write.
///
/// Moves take `&mut self`, so two moves on the same store are always serialised.
#[derive(Debug, Clone)]
pub struct ReorderService<S: OrderStore> {
    store: S,
}

impl<S: OrderStore> ReorderService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Siblings of `scope` in display order (ascending `order`, ties in storage order).
    pub fn ordered_siblings(&self, scope: &SiblingScope) -> LmsResult<Vec<OrderedEntry>> {
        let mut siblings = self.store.siblings(scope)?;
        sort_by_order(&mut siblings);
        Ok(siblings)
    }

    /// Moves `id` one slot in `direction` within `scope`.
    ///
    /// Returns the outcome that was applied. A [`SwapOutcome::NoOp`] writes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store fails to read or write; in that case no order
    /// value has changed.
    pub fn move_entity(
        &mut self,
        scope: &SiblingScope,
        id: &EntityId,
        direction: Direction,
    ) -> LmsResult<SwapOutcome> {
        let siblings = self.ordered_siblings(scope)?;
        let outcome = plan_swap(&siblings, id, direction);

        match &outcome {
            SwapOutcome::Swap(plan) => {
                self.store.write_orders(scope, &plan.patches())?;
                tracing::info!(
                    scope = %scope,
                    id = %id,
                    direction = %direction,
                    neighbour = %plan.neighbour().id,
                    "moved entity"
                );
            }
            SwapOutcome::NoOp(reason) => {
                tracing::debug!(scope = %scope, id = %id, direction = %direction, "no move: {}", reason);
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{has_distinct_orders, EntityKind};
    use crate::reorder::{NoOpReason, OrderPatch};
    use crate::repositories::memory::InMemoryOrderStore;
    use crate::LmsError;

    fn id(s: &str) -> EntityId {
        EntityId::new(s).unwrap()
    }

    fn modules() -> SiblingScope {
        SiblingScope::child_of(EntityKind::Module, id("course-1")).unwrap()
    }

    fn service(ids: &[&str]) -> ReorderService<InMemoryOrderStore> {
        let mut store = InMemoryOrderStore::new();
        for s in ids {
            store.insert(&modules(), id(s)).unwrap();
        }
        ReorderService::new(store)
    }

    fn display_ids(service: &ReorderService<InMemoryOrderStore>) -> Vec<String> {
        service
            .ordered_siblings(&modules())
            .unwrap()
            .into_iter()
            .map(|e| e.id.to_string())
            .collect()
    }

    #[test]
    fn test_move_up_persists_swap() {
        let mut service = service(&["A", "B", "C"]);
        let outcome = service
            .move_entity(&modules(), &id("B"), Direction::Up)
            .unwrap();
        assert!(!outcome.is_noop());
        assert_eq!(display_ids(&service), vec!["B", "A", "C"]);

        let siblings = service.ordered_siblings(&modules()).unwrap();
        assert!(has_distinct_orders(&siblings));
        let orders: Vec<i64> = siblings.iter().map(|e| e.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_repeated_moves_walk_to_the_end() {
        let mut service = service(&["A", "B", "C", "D"]);
        for _ in 0..3 {
            service
                .move_entity(&modules(), &id("A"), Direction::Down)
                .unwrap();
        }
        assert_eq!(display_ids(&service), vec!["B", "C", "D", "A"]);

        let outcome = service
            .move_entity(&modules(), &id("A"), Direction::Down)
            .unwrap();
        assert_eq!(outcome, SwapOutcome::NoOp(NoOpReason::AtBottom));
    }

    #[test]
    fn test_move_uses_display_order_not_storage_order() {
        let mut service = service(&["A", "B", "C"]);
        // Storage order stays A, B, C; display order becomes C, A, B.
        service
            .store
            .write_orders(
                &modules(),
                &[
                    OrderPatch {
                        id: id("C"),
                        order: -1,
                    },
                ],
            )
            .unwrap();

        let outcome = service
            .move_entity(&modules(), &id("A"), Direction::Up)
            .unwrap();
        let plan = outcome.plan().unwrap();
        assert_eq!(plan.neighbour().id, id("C"));
        assert_eq!(display_ids(&service), vec!["A", "C", "B"]);
    }

    #[test]
    fn test_noop_writes_nothing() {
        let mut service = service(&["A", "B"]);
        let before = service.store().siblings(&modules()).unwrap();
        let outcome = service
            .move_entity(&modules(), &id("missing"), Direction::Up)
            .unwrap();
        assert_eq!(outcome, SwapOutcome::NoOp(NoOpReason::TargetNotFound));
        assert_eq!(service.store().siblings(&modules()).unwrap(), before);
    }

    struct FailingStore(InMemoryOrderStore);

    impl OrderStore for FailingStore {
        fn siblings(&self, scope: &SiblingScope) -> LmsResult<Vec<OrderedEntry>> {
            self.0.siblings(scope)
        }

        fn write_orders(&mut self, _: &SiblingScope, _: &[OrderPatch]) -> LmsResult<()> {
            Err(LmsError::InvalidInput("backend unavailable".into()))
        }

        fn insert(&mut self, scope: &SiblingScope, id: EntityId) -> LmsResult<OrderedEntry> {
            self.0.insert(scope, id)
        }

        fn remove(&mut self, scope: &SiblingScope, id: &EntityId) -> LmsResult<OrderedEntry> {
            self.0.remove(scope, id)
        }
    }

    #[test]
    fn test_store_failure_is_reported() {
        let mut inner = InMemoryOrderStore::new();
        inner.insert(&modules(), id("A")).unwrap();
        inner.insert(&modules(), id("B")).unwrap();
        let mut service = ReorderService::new(FailingStore(inner));

        let result = service.move_entity(&modules(), &id("B"), Direction::Up);
        assert!(result.is_err());
        let orders: Vec<i64> = service
            .ordered_siblings(&modules())
            .unwrap()
            .iter()
            .map(|e| e.order)
            .collect();
        assert_eq!(orders, vec![0, 1]);
    }
}
