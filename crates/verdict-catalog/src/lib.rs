//! Immutable, versioned repository of policy entities.
//!
//! A catalog is built once through [`CatalogBuilder`], validated for
//! dangling references and reference cycles at construction, and is
//! read-only afterwards. It is safe to share across concurrent requests.

#![forbid(unsafe_code)]

mod catalog;
mod entity;
mod error;
mod policy;
mod registry;
mod validate;

pub use catalog::{Catalog, CatalogBuilder};
pub use entity::{Action, CatalogEntity, Condition, RefOr, Resolver, Variable};
pub use error::{CatalogError, EvaluationError};
pub use policy::{
    ActionRelationship, NodeDefaults, Policy, PolicyBase, PolicyDefault, PolicyNode,
    PolicyRelationship, PolicySet,
};
pub use registry::Registry;
