//! Pure decision evaluation (no IO).
//!
//! Input: a validated catalog and a per-request context.
//! Output: a decision result plus the outcome of its action phase.
//!
//! Evaluation is synchronous and depth-first; no error raised below a node
//! or action-phase boundary ever escapes to the caller.

#![forbid(unsafe_code)]

mod actions;
mod combine;
mod engine;
mod eval;

pub use actions::run_actions;
pub use engine::{Decision, DecisionEngine};
pub use eval::{evaluate, is_success};
