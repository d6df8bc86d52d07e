//! Public facade over the verdict policy decision engine.
//!
//! Pulls the workspace crates together behind one import:
//!
//! ```
//! use std::sync::Arc;
//! use verdict::{
//!     Catalog, CombinationLogic, DecisionEngine, EvaluationContext, PolicyDefault, PolicyNode,
//!     PolicyRelationship, PolicyResult, PolicySet, RefOr,
//! };
//!
//! let mut set = PolicySet::new(CombinationLogic::DenyOverrides);
//! set.relationships = vec![PolicyRelationship::new(RefOr::value(Arc::new(
//!     PolicyNode::from(PolicyDefault::new(PolicyResult::Deny)),
//! )))];
//!
//! let catalog = Catalog::builder()
//!     .policy(PolicyNode::from(set).with_id("root"))
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let engine = DecisionEngine::new(catalog);
//! let mut ctx = EvaluationContext::new();
//! let decision = engine.decide("root", None, &mut ctx);
//! assert_eq!(decision.result, PolicyResult::Deny);
//! ```

#![forbid(unsafe_code)]

pub use verdict_catalog::{
    Action, ActionRelationship, Catalog, CatalogBuilder, CatalogEntity, CatalogError, Condition,
    EvaluationError, NodeDefaults, Policy, PolicyBase, PolicyDefault, PolicyNode,
    PolicyRelationship, PolicySet, RefOr, Registry, Resolver, Variable,
};
pub use verdict_context::{
    ContextBuilder, DataStore, DecisionCache, EvaluationContext, EventSink, InMemoryCache,
    NoopCache, NoopSink, RecordingSink, ValueStore,
};
pub use verdict_domain::{evaluate, is_success, run_actions, Decision, DecisionEngine};
pub use verdict_settings::{
    parse_config_toml, resolve_config, Overrides, ResolvedOptions, VerdictConfigV1,
};
pub use verdict_types::{
    ActionExecutionStrategy, CombinationLogic, Effect, EntityKind, EntityRef, EvalEvent,
    ExecutionMode, Identity, LabelLogic, PolicyResult, Version, VersionError,
};
