//! # LMS Core
//!
//! Core logic behind the LMS lesson viewer and admin console.
//!
//! This crate contains pure data transforms and the persistence seam they need:
//! - Block-structured lesson content: parsing, sanitisation and rendering to markup
//! - Up/down reordering of categories, courses, modules, submodules, lessons, quizzes and
//!   exercises by swapping `order` values with a neighbour
//! - An [`repositories::OrderStore`] contract for persisting order writes atomically
//!
//! **No API concerns**: HTTP servers and command-line handling belong in `api-rest` and `cli`.

pub mod config;
pub mod constants;
pub mod content;
pub mod entity;
pub mod error;
pub mod reorder;
pub mod repositories;
pub mod validation;

pub use config::CoreConfig;
pub use content::render::ContentRenderer;
pub use content::{Block, Document, LessonContent};
pub use entity::{EntityKind, OrderedEntry, SiblingScope};
pub use error::{LmsError, LmsResult};
pub use lms_types::{EntityId, NonEmptyText};
pub use reorder::{plan_swap, Direction, NoOpReason, OrderPatch, SwapOutcome, SwapPlan};
pub use repositories::memory::InMemoryOrderStore;
pub use repositories::reorder::ReorderService;
pub use repositories::OrderStore;
