//! Orderable LMS entities and the sibling scopes they are ordered within.
//!
//! Categories hold courses, courses hold modules, modules hold submodules, and submodules hold
//! lessons, quizzes and exercises. At every level, siblings share a parent and are displayed in
//! ascending `order`.

use crate::{LmsError, LmsResult};
use lms_types::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Category,
    Course,
    Module,
    Submodule,
    Lesson,
    Quiz,
    Exercise,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Category,
        EntityKind::Course,
        EntityKind::Module,
        EntityKind::Submodule,
        EntityKind::Lesson,
        EntityKind::Quiz,
        EntityKind::Exercise,
    ];

    /// The kind of entity that owns siblings of this kind. Categories are top level.
    pub fn parent_kind(self) -> Option<EntityKind> {
        match self {
            EntityKind::Category => None,
            EntityKind::Course => Some(EntityKind::Category),
            EntityKind::Module => Some(EntityKind::Course),
            EntityKind::Submodule => Some(EntityKind::Module),
            EntityKind::Lesson | EntityKind::Quiz | EntityKind::Exercise => {
                Some(EntityKind::Submodule)
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Category => "category",
            EntityKind::Course => "course",
            EntityKind::Module => "module",
            EntityKind::Submodule => "submodule",
            EntityKind::Lesson => "lesson",
            EntityKind::Quiz => "quiz",
            EntityKind::Exercise => "exercise",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            EntityKind::Category => "categories",
            EntityKind::Course => "courses",
            EntityKind::Module => "modules",
            EntityKind::Submodule => "submodules",
            EntityKind::Lesson => "lessons",
            EntityKind::Quiz => "quizzes",
            EntityKind::Exercise => "exercises",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = LmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LmsError::InvalidInput(format!("unknown entity kind: {}", s)))
    }
}

/// The set of entities whose `order` values are compared with each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SiblingScope {
    kind: EntityKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<EntityId>,
}

impl SiblingScope {
    /// Creates a scope, checking that a parent is given exactly when the kind has one.
    ///
    /// # Errors
    ///
    /// Returns `LmsError::InvalidInput` for a category with a parent, or any other kind
    /// without one.
    pub fn new(kind: EntityKind, parent: Option<EntityId>) -> LmsResult<Self> {
        match (kind.parent_kind(), &parent) {
            (None, Some(p)) => Err(LmsError::InvalidInput(format!(
                "{} is top level and cannot have parent {}",
                kind, p
            ))),
            (Some(parent_kind), None) => Err(LmsError::InvalidInput(format!(
                "{} requires a parent {}",
                kind, parent_kind
            ))),
            _ => Ok(Self { kind, parent }),
        }
    }

    /// The scope holding all categories.
    pub fn categories() -> Self {
        Self {
            kind: EntityKind::Category,
            parent: None,
        }
    }

    pub fn child_of(kind: EntityKind, parent: EntityId) -> LmsResult<Self> {
        Self::new(kind, Some(parent))
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn parent(&self) -> Option<&EntityId> {
        self.parent.as_ref()
    }
}

impl fmt::Display for SiblingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.parent, self.kind.parent_kind()) {
            (Some(parent), Some(parent_kind)) => {
                write!(f, "{} of {} {}", self.kind.plural(), parent_kind, parent)
            }
            _ => f.write_str(self.kind.plural()),
        }
    }
}

impl<'de> Deserialize<'de> for SiblingScope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawScope {
            kind: EntityKind,
            #[serde(default)]
            parent: Option<EntityId>,
        }

        let raw = RawScope::deserialize(deserializer)?;
        SiblingScope::new(raw.kind, raw.parent).map_err(serde::de::Error::custom)
    }
}

/// Anything with an id and a sibling order.
pub trait Orderable {
    fn id(&self) -> &EntityId;
    fn order(&self) -> i64;
}

pub trait OrderableMut: Orderable {
    fn set_order(&mut self, order: i64);
}

/// The minimal `{id, order}` record the reorder protocol works on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedEntry {
    pub id: EntityId,
    pub order: i64,
}

impl OrderedEntry {
    pub fn new(id: EntityId, order: i64) -> Self {
        Self { id, order }
    }
}

impl Orderable for OrderedEntry {
    fn id(&self) -> &EntityId {
        &self.id
    }

    fn order(&self) -> i64 {
        self.order
    }
}

impl OrderableMut for OrderedEntry {
    fn set_order(&mut self, order: i64) {
        self.order = order;
    }
}

/// Order value for a newly created sibling: one past the current maximum, or `0`.
///
/// Gaps left by deletes are not reused.
pub fn append_order<T: Orderable>(siblings: &[T]) -> i64 {
    siblings
        .iter()
        .map(Orderable::order)
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

/// Sorts siblings into display order. The sort is stable, so ties keep their input order.
pub fn sort_by_order<T: Orderable>(siblings: &mut [T]) {
    siblings.sort_by_key(Orderable::order);
}

/// `true` when no two siblings share an `order` value.
pub fn has_distinct_orders<T: Orderable>(siblings: &[T]) -> bool {
    let mut seen = std::collections::HashSet::with_capacity(siblings.len());
    siblings.iter().all(|s| seen.insert(s.order()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> EntityId {
        EntityId::new(s).unwrap()
    }

    fn entry(s: &str, order: i64) -> OrderedEntry {
        OrderedEntry::new(id(s), order)
    }

    #[test]
    fn test_parent_kinds() {
        assert_eq!(EntityKind::Category.parent_kind(), None);
        assert_eq!(
            EntityKind::Course.parent_kind(),
            Some(EntityKind::Category)
        );
        assert_eq!(EntityKind::Quiz.parent_kind(), Some(EntityKind::Submodule));
        assert_eq!(
            EntityKind::Exercise.parent_kind(),
            Some(EntityKind::Submodule)
        );
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Lesson".parse::<EntityKind>().unwrap(), EntityKind::Lesson);
        assert_eq!(" quiz ".parse::<EntityKind>().unwrap(), EntityKind::Quiz);
        assert!("chapter".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_scope_requires_parent_for_nested_kinds() {
        assert!(SiblingScope::new(EntityKind::Lesson, None).is_err());
        assert!(SiblingScope::new(EntityKind::Category, Some(id("x"))).is_err());
        assert!(SiblingScope::new(EntityKind::Category, None).is_ok());
        assert!(SiblingScope::child_of(EntityKind::Module, id("course-1")).is_ok());
    }

    #[test]
    fn test_scope_display() {
        let scope = SiblingScope::child_of(EntityKind::Lesson, id("sub-1")).unwrap();
        assert_eq!(scope.to_string(), "lessons of submodule sub-1");
        assert_eq!(SiblingScope::categories().to_string(), "categories");
    }

    #[test]
    fn test_scope_deserialize_validates() {
        let ok: SiblingScope =
            serde_json::from_str(r#"{"kind": "course", "parent": 3}"#).unwrap();
        assert_eq!(ok.kind(), EntityKind::Course);
        assert_eq!(ok.parent().map(EntityId::as_str), Some("3"));

        let bad: Result<SiblingScope, _> = serde_json::from_str(r#"{"kind": "course"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_append_order() {
        let empty: Vec<OrderedEntry> = Vec::new();
        assert_eq!(append_order(&empty), 0);
        assert_eq!(append_order(&[entry("a", 0), entry("b", 7), entry("c", 2)]), 8);
    }

    #[test]
    fn test_sort_by_order_is_stable() {
        let mut siblings = vec![entry("c", 2), entry("a", 1), entry("b", 1)];
        sort_by_order(&mut siblings);
        let ids: Vec<&str> = siblings.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_has_distinct_orders() {
        assert!(has_distinct_orders(&[entry("a", 0), entry("b", 5)]));
        assert!(!has_distinct_orders(&[entry("a", 1), entry("b", 1)]));
    }
}
