//! Todo authorization policy: the fixed ABAC rule table and the rules callers compose
//! from it.
//!
//! `decide` is pure and re-entrant; it is safe to call from any number of requests at
//! once. Nothing in here performs I/O or holds state.

pub mod api;
pub mod evaluator;
pub mod model;

// Re-exports for thin public surface
pub use api::{affordances, authorize, authorize_delete, can_view, list_scope, visible, Affordances, DeleteGrant, ListScope};
pub use evaluator::decide;
pub use model::{Action, Decision, Denial, Operation, TodoAttrs, TodoStatus, UnknownAction};
