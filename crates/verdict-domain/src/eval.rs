use crate::combine;
use tracing::{debug, warn};
use verdict_catalog::{Catalog, Condition, EvaluationError, PolicyNode, RefOr};
use verdict_context::EvaluationContext;
use verdict_types::{CombinationLogic, EntityKind, PolicyResult};

/// Evaluate one policy node. Infallible: every error raised below this
/// boundary is recorded as a failed event and downgraded to
/// INDETERMINATE_DENY_PERMIT.
pub fn evaluate(
    node: &PolicyNode,
    ctx: &mut EvaluationContext,
    catalog: &Catalog,
) -> PolicyResult {
    // A node is the root of the request exactly when nothing has pushed a
    // path segment yet; children arrive through a parent relationship
    // whose own constraint already gated them.
    let at_root = ctx.depth() == 0;
    let segment = node.path_segment();

    ctx.scoped(segment.clone(), |ctx| {
        let cache_key = node.cache_identity().map(|identity| identity.key());

        if !node.skip_cache() {
            if let Some(key) = &cache_key {
                if let Some(hit) = ctx.cache_get(EntityKind::Policy, key) {
                    ctx.record_cached(EntityKind::Policy, hit);
                    debug!(node = %segment, result = ?hit, "decision served from cache");
                    return hit;
                }
            }
        }

        let result = match gate_and_dispatch(node, at_root, ctx, catalog) {
            Ok(result) => {
                ctx.record_result(EntityKind::Policy, result);
                result
            }
            Err(err) => {
                let reason = err.to_string();
                warn!(node = %segment, %reason, "evaluation failed, downgrading");
                ctx.record_failure(
                    EntityKind::Policy,
                    Some(PolicyResult::IndeterminateDenyPermit),
                    reason,
                );
                PolicyResult::IndeterminateDenyPermit
            }
        };

        if !node.skip_cache() {
            if let Some(key) = &cache_key {
                ctx.cache_put(EntityKind::Policy, key, result);
            }
        }
        result
    })
}

fn gate_and_dispatch(
    node: &PolicyNode,
    at_root: bool,
    ctx: &mut EvaluationContext,
    catalog: &Catalog,
) -> Result<PolicyResult, EvaluationError> {
    if at_root {
        match check_constraint(node.base().constraint.as_ref(), ctx, catalog)? {
            Some(true) => {}
            Some(false) => return Ok(PolicyResult::NotApplicable),
            None => {
                return Ok(if node.base().lenient_constraints {
                    PolicyResult::NotApplicable
                } else {
                    PolicyResult::IndeterminateDenyPermit
                });
            }
        }
    }

    match node {
        PolicyNode::Default(d) => Ok(d.result),
        PolicyNode::Policy(p) => {
            let condition = catalog
                .resolve_condition(&p.condition)
                .ok_or_else(|| missing(&p.condition))?;
            Ok(match condition.check(ctx, catalog)? {
                Some(true) => p.effect.result(),
                Some(false) => {
                    if p.strict_target_effect {
                        p.effect.negated().result()
                    } else {
                        PolicyResult::NotApplicable
                    }
                }
                None => p.effect.indeterminate(),
            })
        }
        PolicyNode::Set(s) => combine::combine(s, ctx, catalog),
    }
}

/// Three-way constraint gate shared by node, relationship, and action
/// entry gating. A missing constraint is an open gate.
pub(crate) fn check_constraint(
    constraint: Option<&RefOr<dyn Condition>>,
    ctx: &mut EvaluationContext,
    catalog: &Catalog,
) -> Result<Option<bool>, EvaluationError> {
    let Some(field) = constraint else {
        return Ok(Some(true));
    };
    let condition = catalog
        .resolve_condition(field)
        .ok_or_else(|| missing(field))?;
    condition.check(ctx, catalog)
}

fn missing<T: ?Sized>(field: &RefOr<T>) -> EvaluationError {
    match field.as_ref_descriptor() {
        Some(r) => EvaluationError::MissingReference(r.clone()),
        // Inline values always resolve; this arm is unreachable by
        // construction but kept total.
        None => EvaluationError::other("inline value failed to resolve"),
    }
}

/// Whether a result counts as this node succeeding, used to decide
/// default action eligibility.
pub fn is_success(node: &PolicyNode, result: PolicyResult) -> bool {
    match node {
        PolicyNode::Policy(p) => result == p.effect.result(),
        PolicyNode::Default(d) => result == d.result,
        PolicyNode::Set(s) => match s.logic {
            CombinationLogic::DenyOverrides | CombinationLogic::DenyUnlessPermit => {
                result == PolicyResult::Deny
            }
            CombinationLogic::PermitOverrides | CombinationLogic::PermitUnlessDeny => {
                result == PolicyResult::Permit
            }
            CombinationLogic::FirstApplicable | CombinationLogic::OnlyOneApplicable => {
                result.is_applicable()
            }
        },
    }
}
