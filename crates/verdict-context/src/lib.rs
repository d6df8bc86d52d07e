//! Per-request mutable state threaded through the evaluation call tree.
//!
//! One `EvaluationContext` per logical request. Nothing here is
//! synchronized; concurrent requests must not share a context. The data
//! store is the only piece business logic mutates, and it is the unit of
//! rollback.

#![forbid(unsafe_code)]

mod cache;
mod context;
mod sink;
mod store;

pub use cache::{DecisionCache, InMemoryCache, NoopCache};
pub use context::{ContextBuilder, EvaluationContext};
pub use sink::{EventSink, NoopSink, RecordingSink};
pub use store::{DataStore, ValueStore};
