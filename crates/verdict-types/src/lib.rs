//! Stable DTOs and IDs used across the verdict workspace.
//!
//! This crate is intentionally boring:
//! - the decision result enum with its fixed wire tokens
//! - entity identities, versions, and reference descriptors
//! - the combination/execution mode enums
//! - the audit event record

#![forbid(unsafe_code)]

pub mod event;
pub mod ids;
pub mod identity;
pub mod modes;
pub mod result;
pub mod version;

pub use event::EvalEvent;
pub use identity::{EntityKind, EntityRef, Identity, LabelLogic};
pub use modes::{ActionExecutionStrategy, CombinationLogic, ExecutionMode};
pub use result::{Effect, PolicyResult};
pub use version::{Version, VersionError};
