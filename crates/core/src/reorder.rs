//! Up/down reordering by swapping `order` values with the adjacent sibling.
//!
//! Every admin list (categories, courses, modules, submodules, lessons, quizzes, exercises)
//! reorders the same way. Moving an entity exchanges its `order` with its immediate neighbour,
//! so the set of order values in the scope never changes and stays pairwise distinct.
//!
//! [`plan_swap`] is pure: it only computes the two writes. Persisting them is the caller's
//! job, and both writes must land together (see [`crate::repositories::OrderStore`]).

use crate::entity::{Orderable, OrderableMut};
use crate::LmsError;
use lms_types::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// One position earlier.
    Up,
    /// One position later.
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
        }
    }
}

impl FromStr for Direction {
    type Err = LmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            _ => Err(LmsError::InvalidInput(format!(
                "direction must be 'up' or 'down', got '{}'",
                s
            ))),
        }
    }
}

/// One `(id, order)` write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPatch {
    pub id: EntityId,
    pub order: i64,
}

/// The two writes that exchange the orders of a target and its neighbour.
///
/// Serialises as a two-element array of [`OrderPatch`], target first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPlan {
    target: OrderPatch,
    neighbour: OrderPatch,
}

impl SwapPlan {
    /// The moved entity with its new order (the neighbour's old order).
    pub fn target(&self) -> &OrderPatch {
        &self.target
    }

    /// The neighbour with its new order (the target's old order).
    pub fn neighbour(&self) -> &OrderPatch {
        &self.neighbour
    }

    pub fn patches(&self) -> [OrderPatch; 2] {
        [self.target.clone(), self.neighbour.clone()]
    }

    /// New order for `id` under this plan, if the plan touches it.
    pub fn order_for(&self, id: &EntityId) -> Option<i64> {
        [&self.target, &self.neighbour]
            .into_iter()
            .find(|p| &p.id == id)
            .map(|p| p.order)
    }

    /// Applies the plan to an in-memory sibling list.
    ///
    /// Nothing is changed unless both entities are present. Returns whether the plan was
    /// applied. Only the `order` fields change; callers that display the list should re-sort.
    pub fn apply<T: OrderableMut>(&self, siblings: &mut [T]) -> bool {
        let present = |id: &EntityId| siblings.iter().any(|s| s.id() == id);
        if !present(&self.target.id) || !present(&self.neighbour.id) {
            return false;
        }

        for sibling in siblings.iter_mut() {
            if let Some(order) = self.order_for(sibling.id()) {
                sibling.set_order(order);
            }
        }
        true
    }
}

impl Serialize for SwapPlan {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.patches().serialize(serializer)
    }
}

/// Why a move did not produce a plan. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoOpReason {
    TargetNotFound,
    AtTop,
    AtBottom,
}

impl fmt::Display for NoOpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoOpReason::TargetNotFound => f.write_str("target not found"),
            NoOpReason::AtTop => f.write_str("already at the top"),
            NoOpReason::AtBottom => f.write_str("already at the bottom"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    Swap(SwapPlan),
    NoOp(NoOpReason),
}

impl SwapOutcome {
    pub fn plan(&self) -> Option<&SwapPlan> {
        match self {
            SwapOutcome::Swap(plan) => Some(plan),
            SwapOutcome::NoOp(_) => None,
        }
    }

    pub fn into_plan(self) -> Option<SwapPlan> {
        match self {
            SwapOutcome::Swap(plan) => Some(plan),
            SwapOutcome::NoOp(_) => None,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, SwapOutcome::NoOp(_))
    }
}

/// Plans moving `target_id` one slot in `direction` within `siblings`.
///
/// `siblings` is taken as the authoritative display order; it is not re-sorted here.
/// Missing targets and moves past either end are [`SwapOutcome::NoOp`].
pub fn plan_swap<T: Orderable>(
    siblings: &[T],
    target_id: &EntityId,
    direction: Direction,
) -> SwapOutcome {
    let Some(index) = siblings.iter().position(|s| s.id() == target_id) else {
        return SwapOutcome::NoOp(NoOpReason::TargetNotFound);
    };

    let neighbour_index = match direction {
        Direction::Up => match index.checked_sub(1) {
            Some(i) => i,
            None => return SwapOutcome::NoOp(NoOpReason::AtTop),
        },
        Direction::Down => {
            if index + 1 >= siblings.len() {
                return SwapOutcome::NoOp(NoOpReason::AtBottom);
            }
            index + 1
        }
    };

    let target = &siblings[index];
    let neighbour = &siblings[neighbour_index];

    if target.order() == neighbour.order() {
        tracing::warn!(
            moved = %target.id(),
            neighbour = %neighbour.id(),
            order = target.order(),
            "siblings share an order value; swap will not change display order"
        );
    }

    SwapOutcome::Swap(SwapPlan {
        target: OrderPatch {
            id: target.id().clone(),
            order: neighbour.order(),
        },
        neighbour: OrderPatch {
            id: neighbour.id().clone(),
            order: target.order(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{has_distinct_orders, sort_by_order, OrderedEntry};

    fn id(s: &str) -> EntityId {
        EntityId::new(s).unwrap()
    }

    fn abc() -> Vec<OrderedEntry> {
        vec![
            OrderedEntry::new(id("A"), 0),
            OrderedEntry::new(id("B"), 1),
            OrderedEntry::new(id("C"), 2),
        ]
    }

    #[test]
    fn test_swap_at_boundaries_is_noop() {
        let siblings = abc();
        assert_eq!(
            plan_swap(&siblings, &id("A"), Direction::Up),
            SwapOutcome::NoOp(NoOpReason::AtTop)
        );
        assert_eq!(
            plan_swap(&siblings, &id("C"), Direction::Down),
            SwapOutcome::NoOp(NoOpReason::AtBottom)
        );
    }

    #[test]
    fn test_unknown_target_is_noop() {
        assert_eq!(
            plan_swap(&abc(), &id("nonexistent-id"), Direction::Up),
            SwapOutcome::NoOp(NoOpReason::TargetNotFound)
        );
        let empty: Vec<OrderedEntry> = Vec::new();
        assert!(plan_swap(&empty, &id("A"), Direction::Down).is_noop());
    }

    #[test]
    fn test_swap_exchanges_exactly_two_orders() {
        let mut siblings = abc();
        let plan = plan_swap(&siblings, &id("B"), Direction::Up)
            .into_plan()
            .unwrap();

        assert_eq!(plan.order_for(&id("A")), Some(1));
        assert_eq!(plan.order_for(&id("B")), Some(0));
        assert_eq!(plan.order_for(&id("C")), None);

        assert!(plan.apply(&mut siblings));
        sort_by_order(&mut siblings);
        assert_eq!(
            siblings,
            vec![
                OrderedEntry::new(id("B"), 0),
                OrderedEntry::new(id("A"), 1),
                OrderedEntry::new(id("C"), 2),
            ]
        );
        assert!(has_distinct_orders(&siblings));
    }

    #[test]
    fn test_swap_down_with_gaps() {
        let siblings = vec![
            OrderedEntry::new(id("x"), 10),
            OrderedEntry::new(id("y"), 40),
            OrderedEntry::new(id("z"), 41),
        ];
        let plan = plan_swap(&siblings, &id("x"), Direction::Down)
            .into_plan()
            .unwrap();
        assert_eq!(
            plan.patches(),
            [
                OrderPatch {
                    id: id("x"),
                    order: 40
                },
                OrderPatch {
                    id: id("y"),
                    order: 10
                },
            ]
        );
    }

    #[test]
    fn test_planner_trusts_caller_sequence() {
        // Display order differs from numeric order; the neighbour is positional.
        let siblings = vec![
            OrderedEntry::new(id("A"), 5),
            OrderedEntry::new(id("B"), 1),
        ];
        let plan = plan_swap(&siblings, &id("B"), Direction::Up)
            .into_plan()
            .unwrap();
        assert_eq!(plan.target().order, 5);
        assert_eq!(plan.neighbour().id, id("A"));
        assert_eq!(plan.neighbour().order, 1);
    }

    #[test]
    fn test_equal_orders_still_plan_exact_exchange() {
        let siblings = vec![OrderedEntry::new(id("A"), 1), OrderedEntry::new(id("B"), 1)];
        let plan = plan_swap(&siblings, &id("A"), Direction::Down)
            .into_plan()
            .unwrap();
        assert_eq!(
            plan.patches(),
            [
                OrderPatch {
                    id: id("A"),
                    order: 1
                },
                OrderPatch {
                    id: id("B"),
                    order: 1
                },
            ]
        );
    }

    #[test]
    fn test_apply_requires_both_entities() {
        let plan = plan_swap(&abc(), &id("C"), Direction::Up)
            .into_plan()
            .unwrap();
        let mut partial = vec![OrderedEntry::new(id("C"), 2)];
        assert!(!plan.apply(&mut partial));
        assert_eq!(partial[0].order, 2);
    }

    #[test]
    fn test_plan_serialises_as_patch_array() {
        let plan = plan_swap(&abc(), &id("B"), Direction::Down)
            .into_plan()
            .unwrap();
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"id": "B", "order": 2}, {"id": "C", "order": 1}])
        );
    }

    #[test]
    fn test_direction_parse_and_display() {
        assert_eq!("UP".parse::<Direction>().unwrap(), Direction::Up);
        assert_eq!(" down ".parse::<Direction>().unwrap(), Direction::Down);
        assert!("left".parse::<Direction>().is_err());
        assert_eq!(Direction::Down.to_string(), "down");
        assert_eq!(
            serde_json::from_str::<Direction>(r#""up""#).unwrap(),
            Direction::Up
        );
    }
}
