//! Action phase: runs a node's attached actions after its evaluation,
//! under one of four execution strategies.
//!
//! Like evaluation, the phase is infallible at its boundary: action
//! errors are recorded as failed events and folded into the returned
//! success flag.

use crate::{combine, eval};
use tracing::warn;
use verdict_catalog::{ActionRelationship, Catalog, PolicyBase, PolicyNode};
use verdict_context::EvaluationContext;
use verdict_types::{ids, ActionExecutionStrategy, EntityKind, PolicyResult};

/// Run the actions attached to `node` for the decision `result`.
///
/// Returns whether the phase as a whole succeeded. A node with no
/// eligible actions trivially succeeds.
pub fn run_actions(
    node: &PolicyNode,
    result: PolicyResult,
    ctx: &mut EvaluationContext,
    catalog: &Catalog,
) -> bool {
    let succeeded = eval::is_success(node, result);
    let eligible: Vec<&ActionRelationship> =
        combine::by_priority(&node.base().actions, |rel| rel.priority)
            .into_iter()
            .filter(|rel| match &rel.execution_modes {
                Some(modes) if !modes.is_empty() => modes.iter().any(|m| m.matches(result)),
                // No explicit filter: actions run only when the node
                // reached its own notion of success.
                _ => succeeded,
            })
            .collect();
    if eligible.is_empty() {
        return true;
    }

    ctx.scoped(node.path_segment(), |ctx| {
        ctx.scoped(ids::SEGMENT_ACTIONS, |ctx| {
            execute(node.base().action_strategy, node.base(), &eligible, ctx, catalog)
        })
    })
}

/// What happened to one action entry.
enum Outcome {
    /// The action ran and reported this flag.
    Ran(bool),
    /// Constraint returned false: the entry does not participate.
    Skipped,
    /// Constraint returned null under strict constraints.
    NullConstraint,
    /// The action reference did not resolve.
    Missing,
    /// The action or its constraint raised an error.
    Failed(String),
}

impl Outcome {
    /// Anything other than a successful run or a clean skip.
    fn is_bad(&self) -> bool {
        !matches!(self, Outcome::Ran(true) | Outcome::Skipped)
    }
}

fn execute(
    strategy: ActionExecutionStrategy,
    base: &PolicyBase,
    eligible: &[&ActionRelationship],
    ctx: &mut EvaluationContext,
    catalog: &Catalog,
) -> bool {
    match strategy {
        ActionExecutionStrategy::RunAll => {
            let mut saw_bad = false;
            for rel in eligible {
                if step(base, rel, ctx, catalog).is_bad() {
                    saw_bad = true;
                }
            }
            !saw_bad || base.ignore_errors
        }
        ActionExecutionStrategy::UntilSuccess => {
            for rel in eligible {
                if matches!(step(base, rel, ctx, catalog), Outcome::Ran(true)) {
                    return true;
                }
            }
            false
        }
        ActionExecutionStrategy::StopOnFailure => run_until_bad(base, eligible, ctx, catalog),
        ActionExecutionStrategy::RollbackOnFailure => {
            let snapshot = ctx.data().snapshot();
            let ok = run_until_bad(base, eligible, ctx, catalog);
            if !ok {
                ctx.data_mut().restore(snapshot);
            }
            ok
        }
    }
}

/// Shared body of STOP_ON_FAILURE and ROLLBACK_ON_FAILURE: abort on the
/// first bad outcome, skips do not count.
fn run_until_bad(
    base: &PolicyBase,
    eligible: &[&ActionRelationship],
    ctx: &mut EvaluationContext,
    catalog: &Catalog,
) -> bool {
    for rel in eligible {
        if step(base, rel, ctx, catalog).is_bad() {
            return false;
        }
    }
    true
}

fn step(
    base: &PolicyBase,
    rel: &ActionRelationship,
    ctx: &mut EvaluationContext,
    catalog: &Catalog,
) -> Outcome {
    let segment = segment_of(rel);
    ctx.scoped(segment.clone(), |ctx| {
        let outcome = attempt(base, rel, ctx, catalog);
        match &outcome {
            Outcome::Ran(false) => {
                ctx.record_failure(EntityKind::Action, None, "action reported failure");
            }
            Outcome::NullConstraint => {
                ctx.record_failure(EntityKind::Action, None, "constraint returned null");
            }
            Outcome::Missing => {
                let reason = match rel.action.as_ref_descriptor() {
                    Some(r) => format!("unresolved reference {r}"),
                    None => "unresolved action".to_string(),
                };
                warn!(action = %segment, %reason, "action skipped");
                ctx.record_failure(EntityKind::Action, None, reason);
            }
            Outcome::Failed(reason) => {
                warn!(action = %segment, %reason, "action failed");
                ctx.record_failure(EntityKind::Action, None, reason.clone());
            }
            Outcome::Ran(true) | Outcome::Skipped => {}
        }
        outcome
    })
}

fn attempt(
    base: &PolicyBase,
    rel: &ActionRelationship,
    ctx: &mut EvaluationContext,
    catalog: &Catalog,
) -> Outcome {
    match eval::check_constraint(rel.constraint.as_ref(), ctx, catalog) {
        Ok(Some(true)) => {}
        Ok(Some(false)) => return Outcome::Skipped,
        Ok(None) => {
            return if base.lenient_constraints {
                Outcome::Skipped
            } else {
                Outcome::NullConstraint
            };
        }
        Err(err) => return Outcome::Failed(err.to_string()),
    }

    let Some(action) = catalog.resolve_action(&rel.action) else {
        return Outcome::Missing;
    };
    match action.run(ctx, catalog) {
        Ok(flag) => Outcome::Ran(flag),
        Err(err) => Outcome::Failed(err.to_string()),
    }
}

/// Audit path segment for one action entry.
fn segment_of(rel: &ActionRelationship) -> String {
    match rel.action.as_ref_descriptor() {
        Some(r) => match &r.version {
            Some(v) => format!("{}:{v}", r.id),
            None => r.id.clone(),
        },
        None => ids::SEGMENT_ACTION.to_string(),
    }
}
