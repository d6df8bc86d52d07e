//! Test fixtures shared across the workspace: stub conditions and
//! actions, catalog assembly shortcuts, and node builders.
//!
//! Everything here is deterministic and side-effect free except where a
//! stub's whole point is the side effect (counting, data-store writes).

#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use verdict_catalog::{
    Action, Catalog, CatalogBuilder, CatalogEntity, Condition, EvaluationError, Policy,
    PolicyDefault, PolicyNode, PolicyRelationship, PolicySet, RefOr,
};
use verdict_context::{EvaluationContext, RecordingSink};
use verdict_types::{CombinationLogic, Effect, Identity, PolicyResult};

// ---------------------------------------------------------------------------
// Conditions

/// Condition that always returns the same tri-state outcome.
#[derive(Debug)]
pub struct ConstCondition {
    identity: Option<Identity>,
    outcome: Option<bool>,
}

impl ConstCondition {
    pub fn new(outcome: Option<bool>) -> Self {
        Self {
            identity: None,
            outcome,
        }
    }

    pub fn named(id: impl Into<String>, outcome: Option<bool>) -> Self {
        Self {
            identity: Some(Identity::new(id)),
            outcome,
        }
    }
}

impl CatalogEntity for ConstCondition {
    fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }
}

impl Condition for ConstCondition {
    fn check(
        &self,
        _ctx: &mut EvaluationContext,
        _catalog: &Catalog,
    ) -> Result<Option<bool>, EvaluationError> {
        Ok(self.outcome)
    }
}

/// Like [`ConstCondition`], but counts how many times it was checked.
/// Used to observe cache behavior.
#[derive(Debug)]
pub struct CountingCondition {
    outcome: Option<bool>,
    count: Arc<AtomicUsize>,
}

impl CatalogEntity for CountingCondition {
    fn identity(&self) -> Option<&Identity> {
        None
    }
}

impl Condition for CountingCondition {
    fn check(
        &self,
        _ctx: &mut EvaluationContext,
        _catalog: &Catalog,
    ) -> Result<Option<bool>, EvaluationError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(self.outcome)
    }
}

/// Condition that always raises an evaluation error.
#[derive(Debug)]
pub struct ErrorCondition {
    message: String,
}

impl CatalogEntity for ErrorCondition {
    fn identity(&self) -> Option<&Identity> {
        None
    }
}

impl Condition for ErrorCondition {
    fn check(
        &self,
        _ctx: &mut EvaluationContext,
        _catalog: &Catalog,
    ) -> Result<Option<bool>, EvaluationError> {
        Err(EvaluationError::condition(self.message.clone()))
    }
}

/// Inline condition returning a fixed outcome.
pub fn const_condition(outcome: Option<bool>) -> RefOr<dyn Condition> {
    RefOr::value(Arc::new(ConstCondition::new(outcome)))
}

/// Inline condition returning a fixed outcome and an invocation counter.
pub fn counting_condition(outcome: Option<bool>) -> (RefOr<dyn Condition>, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let condition = CountingCondition {
        outcome,
        count: Arc::clone(&count),
    };
    (RefOr::value(Arc::new(condition)), count)
}

/// Inline condition that always fails with `message`.
pub fn error_condition(message: impl Into<String>) -> RefOr<dyn Condition> {
    RefOr::value(Arc::new(ErrorCondition {
        message: message.into(),
    }))
}

// ---------------------------------------------------------------------------
// Actions

/// Action that writes one string entry into the context's data store.
#[derive(Debug)]
pub struct SaveAction {
    identity: Option<Identity>,
    key: String,
    value: serde_json::Value,
}

impl SaveAction {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            identity: None,
            key: key.into(),
            value: serde_json::Value::String(value.into()),
        }
    }

    pub fn named(id: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            identity: Some(Identity::new(id)),
            ..Self::new(key, value)
        }
    }
}

impl CatalogEntity for SaveAction {
    fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }
}

impl Action for SaveAction {
    fn run(
        &self,
        ctx: &mut EvaluationContext,
        _catalog: &Catalog,
    ) -> Result<bool, EvaluationError> {
        ctx.data_mut().put(self.key.clone(), self.value.clone());
        Ok(true)
    }
}

/// Action that runs cleanly but reports failure.
#[derive(Debug)]
pub struct FailAction;

impl CatalogEntity for FailAction {
    fn identity(&self) -> Option<&Identity> {
        None
    }
}

impl Action for FailAction {
    fn run(
        &self,
        _ctx: &mut EvaluationContext,
        _catalog: &Catalog,
    ) -> Result<bool, EvaluationError> {
        Ok(false)
    }
}

/// Action that raises an execution error.
#[derive(Debug)]
pub struct ErrorAction {
    message: String,
}

impl CatalogEntity for ErrorAction {
    fn identity(&self) -> Option<&Identity> {
        None
    }
}

impl Action for ErrorAction {
    fn run(
        &self,
        _ctx: &mut EvaluationContext,
        _catalog: &Catalog,
    ) -> Result<bool, EvaluationError> {
        Err(EvaluationError::action(self.message.clone()))
    }
}

/// Inline action writing `key = value` into the data store.
pub fn save_action(key: impl Into<String>, value: impl Into<String>) -> RefOr<dyn Action> {
    RefOr::value(Arc::new(SaveAction::new(key, value)))
}

/// Inline action that reports soft failure.
pub fn fail_action() -> RefOr<dyn Action> {
    RefOr::value(Arc::new(FailAction))
}

/// Inline action that always errors with `message`.
pub fn error_action(message: impl Into<String>) -> RefOr<dyn Action> {
    RefOr::value(Arc::new(ErrorAction {
        message: message.into(),
    }))
}

// ---------------------------------------------------------------------------
// Nodes and catalogs

/// Anonymous constant node producing `result`.
pub fn constant_node(result: PolicyResult) -> PolicyNode {
    PolicyNode::from(PolicyDefault::new(result))
}

/// Named policy whose condition is always true, targeting PERMIT.
pub fn permit_policy(id: impl Into<String>) -> PolicyNode {
    PolicyNode::from(Policy::new(Effect::Permit, const_condition(Some(true)))).with_id(id)
}

/// Named policy whose condition is always true, targeting DENY.
pub fn deny_policy(id: impl Into<String>) -> PolicyNode {
    PolicyNode::from(Policy::new(Effect::Deny, const_condition(Some(true)))).with_id(id)
}

/// Relationship wrapping an inline child node.
pub fn relationship(node: PolicyNode) -> PolicyRelationship {
    PolicyRelationship::new(RefOr::value(Arc::new(node)))
}

/// Anonymous set combining inline children under `logic`.
pub fn set_of(logic: CombinationLogic, children: Vec<PolicyNode>) -> PolicySet {
    let mut set = PolicySet::new(logic);
    set.relationships = children.into_iter().map(relationship).collect();
    set
}

/// Validated catalog holding the given named policies and nothing else.
pub fn catalog_with(policies: Vec<PolicyNode>) -> Catalog {
    let mut builder = CatalogBuilder::new();
    for node in policies {
        builder = builder.policy(node).expect("register policy");
    }
    builder.build().expect("valid catalog")
}

/// Context wired to a recording sink, returned alongside a clone of the
/// sink for assertions.
pub fn recording_context() -> (EvaluationContext, RecordingSink) {
    let sink = RecordingSink::new();
    let ctx = EvaluationContext::builder().sink(sink.clone()).build();
    (ctx, sink)
}
