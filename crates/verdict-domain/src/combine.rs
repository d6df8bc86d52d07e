//! The six combination logics a policy set can use to merge child results.
//!
//! Children are visited in descending priority order; equal priorities
//! keep their declaration order (stable sort). Short-circuiting and
//! rollback both depend on this ordering, so it is a contract.

use crate::{actions, eval};
use std::cmp::Reverse;
use verdict_catalog::{Catalog, EvaluationError, PolicyRelationship, PolicySet};
use verdict_context::EvaluationContext;
use verdict_types::{CombinationLogic, Effect, PolicyResult};

/// Stable priority ordering shared with the action executor.
pub(crate) fn by_priority<T, F: Fn(&T) -> i32>(items: &[T], priority: F) -> Vec<&T> {
    let mut ordered: Vec<&T> = items.iter().collect();
    ordered.sort_by_key(|item| Reverse(priority(item)));
    ordered
}

pub(crate) fn combine(
    set: &PolicySet,
    ctx: &mut EvaluationContext,
    catalog: &Catalog,
) -> Result<PolicyResult, EvaluationError> {
    let order = by_priority(&set.relationships, |rel| rel.priority);
    match set.logic {
        CombinationLogic::DenyOverrides => overrides(set, &order, ctx, catalog, Effect::Deny),
        CombinationLogic::PermitOverrides => overrides(set, &order, ctx, catalog, Effect::Permit),
        CombinationLogic::DenyUnlessPermit => unless(set, &order, ctx, catalog, Effect::Permit),
        CombinationLogic::PermitUnlessDeny => unless(set, &order, ctx, catalog, Effect::Deny),
        CombinationLogic::FirstApplicable => first_applicable(set, &order, ctx, catalog),
        CombinationLogic::OnlyOneApplicable => only_one_applicable(set, &order, ctx, catalog),
    }
}

/// Outcome of processing one child entry before logic-specific
/// aggregation.
enum Entry {
    /// Constraint returned false, or null under lenient constraints.
    Skipped,
    /// Constraint returned null under strict constraints: an
    /// indeterminate contribution.
    StrictNull,
    /// The child reference did not resolve against the catalog.
    MissingChild,
    /// The child evaluated (and, when enabled, ran its actions).
    Result(PolicyResult),
}

/// Constraint gate, child resolution, evaluation, and the optional child
/// action phase. Constraint errors bubble to the node boundary.
fn step(
    set: &PolicySet,
    rel: &PolicyRelationship,
    ctx: &mut EvaluationContext,
    catalog: &Catalog,
) -> Result<Entry, EvaluationError> {
    match eval::check_constraint(rel.constraint.as_ref(), ctx, catalog)? {
        Some(true) => {}
        Some(false) => return Ok(Entry::Skipped),
        None => {
            return Ok(if set.base.lenient_constraints {
                Entry::Skipped
            } else {
                Entry::StrictNull
            });
        }
    }

    let Some(child) = catalog.resolve_policy(&rel.policy) else {
        return Ok(Entry::MissingChild);
    };

    let mut result = eval::evaluate(&child, ctx, catalog);

    if set.run_child_actions && rel.run_action {
        let ok = actions::run_actions(&child, result, ctx, catalog);
        if !ok && set.indeterminate_on_action_fail {
            result = PolicyResult::IndeterminateDenyPermit;
        }
    }
    Ok(Entry::Result(result))
}

/// DENY_OVERRIDES and its PERMIT mirror. `primary` is the overriding
/// effect: its first occurrence short-circuits.
fn overrides(
    set: &PolicySet,
    order: &[&PolicyRelationship],
    ctx: &mut EvaluationContext,
    catalog: &Catalog,
    primary: Effect,
) -> Result<PolicyResult, EvaluationError> {
    let secondary = primary.negated();
    let mut saw_both_ind = false;
    let mut saw_primary_ind = false;
    let mut saw_secondary = false;
    let mut saw_secondary_ind = false;

    for rel in order {
        match step(set, rel, ctx, catalog)? {
            Entry::Skipped => {}
            Entry::StrictNull => saw_both_ind = true,
            Entry::MissingChild => return Ok(PolicyResult::IndeterminateDenyPermit),
            Entry::Result(result) => {
                if result == primary.result() {
                    return Ok(primary.result());
                }
                if result == PolicyResult::IndeterminateDenyPermit {
                    saw_both_ind = true;
                } else if result == primary.indeterminate() {
                    saw_primary_ind = true;
                } else if result == secondary.result() {
                    saw_secondary = true;
                } else if result == secondary.indeterminate() {
                    saw_secondary_ind = true;
                }
                // NOT_APPLICABLE contributes nothing.
            }
        }
    }

    Ok(if saw_both_ind {
        PolicyResult::IndeterminateDenyPermit
    } else if saw_primary_ind && (saw_secondary_ind || saw_secondary) {
        PolicyResult::IndeterminateDenyPermit
    } else if saw_primary_ind {
        primary.indeterminate()
    } else if saw_secondary {
        secondary.result()
    } else if saw_secondary_ind {
        secondary.indeterminate()
    } else {
        PolicyResult::NotApplicable
    })
}

/// DENY_UNLESS_PERMIT and its mirror. `target` is the sought effect; any
/// other contribution is invalid, and under `strict_unless_logic` the
/// first invalid one aborts with INDETERMINATE_DENY_PERMIT.
fn unless(
    set: &PolicySet,
    order: &[&PolicyRelationship],
    ctx: &mut EvaluationContext,
    catalog: &Catalog,
    target: Effect,
) -> Result<PolicyResult, EvaluationError> {
    for rel in order {
        match step(set, rel, ctx, catalog)? {
            Entry::Skipped => {}
            Entry::StrictNull => {
                if set.strict_unless_logic {
                    return Ok(PolicyResult::IndeterminateDenyPermit);
                }
            }
            Entry::MissingChild => return Ok(PolicyResult::IndeterminateDenyPermit),
            Entry::Result(result) => {
                if result == target.result() {
                    return Ok(target.result());
                }
                if set.strict_unless_logic {
                    return Ok(PolicyResult::IndeterminateDenyPermit);
                }
            }
        }
    }
    Ok(target.negated().result())
}

/// FIRST_APPLICABLE: the first definitive PERMIT/DENY wins. A missing
/// reference or strict-null constraint sets the running result to
/// INDETERMINATE_DENY_PERMIT but the loop continues.
fn first_applicable(
    set: &PolicySet,
    order: &[&PolicyRelationship],
    ctx: &mut EvaluationContext,
    catalog: &Catalog,
) -> Result<PolicyResult, EvaluationError> {
    let mut running = PolicyResult::NotApplicable;
    for rel in order {
        match step(set, rel, ctx, catalog)? {
            Entry::Skipped => {}
            Entry::StrictNull | Entry::MissingChild => {
                running = PolicyResult::IndeterminateDenyPermit;
            }
            Entry::Result(result) if result.is_applicable() => return Ok(result),
            Entry::Result(_) => {}
        }
    }
    Ok(running)
}

/// ONLY_ONE_APPLICABLE: a second definitive result aborts the whole
/// combination.
fn only_one_applicable(
    set: &PolicySet,
    order: &[&PolicyRelationship],
    ctx: &mut EvaluationContext,
    catalog: &Catalog,
) -> Result<PolicyResult, EvaluationError> {
    let mut found: Option<PolicyResult> = None;
    let mut pending = PolicyResult::NotApplicable;
    for rel in order {
        match step(set, rel, ctx, catalog)? {
            Entry::Skipped => {}
            Entry::StrictNull => pending = PolicyResult::IndeterminateDenyPermit,
            Entry::MissingChild => return Ok(PolicyResult::IndeterminateDenyPermit),
            Entry::Result(result) if result.is_applicable() => {
                if found.is_some() {
                    return Ok(PolicyResult::IndeterminateDenyPermit);
                }
                found = Some(result);
            }
            Entry::Result(_) => {}
        }
    }
    Ok(found.unwrap_or(pending))
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_catalog::{PolicyNode, RefOr};
    use verdict_test_util::{
        catalog_with, const_condition, constant_node, relationship, set_of,
    };
    use verdict_types::{EntityKind, EntityRef};

    fn empty_catalog() -> Catalog {
        catalog_with(Vec::new())
    }

    fn run(set: PolicySet) -> PolicyResult {
        let mut ctx = EvaluationContext::new();
        eval::evaluate(&PolicyNode::from(set), &mut ctx, &empty_catalog())
    }

    #[test]
    fn deny_overrides_short_circuits_on_deny() {
        let set = set_of(
            CombinationLogic::DenyOverrides,
            vec![
                constant_node(PolicyResult::Permit),
                constant_node(PolicyResult::Deny),
                // Would escalate the outcome if it were ever reached.
                constant_node(PolicyResult::IndeterminateDenyPermit),
            ],
        );
        assert_eq!(run(set), PolicyResult::Deny);
    }

    #[test]
    fn deny_overrides_fallback_table() {
        use PolicyResult::*;
        let cases: Vec<(Vec<PolicyResult>, PolicyResult)> = vec![
            (vec![Permit, NotApplicable], Permit),
            (vec![IndeterminateDeny], IndeterminateDeny),
            (vec![IndeterminateDeny, Permit], IndeterminateDenyPermit),
            (
                vec![IndeterminateDeny, IndeterminatePermit],
                IndeterminateDenyPermit,
            ),
            (vec![IndeterminateDenyPermit, Permit], IndeterminateDenyPermit),
            (vec![IndeterminatePermit], IndeterminatePermit),
            (vec![NotApplicable, NotApplicable], NotApplicable),
            (vec![], NotApplicable),
        ];
        for (children, expected) in cases {
            let set = set_of(
                CombinationLogic::DenyOverrides,
                children.iter().copied().map(constant_node).collect(),
            );
            assert_eq!(run(set), expected, "children {children:?}");
        }
    }

    #[test]
    fn permit_overrides_mirrors_deny_overrides() {
        use PolicyResult::*;
        let set = set_of(
            CombinationLogic::PermitOverrides,
            vec![constant_node(Deny), constant_node(Permit)],
        );
        assert_eq!(run(set), Permit);

        let set = set_of(
            CombinationLogic::PermitOverrides,
            vec![constant_node(IndeterminatePermit), constant_node(Deny)],
        );
        assert_eq!(run(set), IndeterminateDenyPermit);

        let set = set_of(
            CombinationLogic::PermitOverrides,
            vec![constant_node(IndeterminatePermit)],
        );
        assert_eq!(run(set), IndeterminatePermit);
    }

    #[test]
    fn deny_unless_permit_defaults_to_deny() {
        let set = set_of(
            CombinationLogic::DenyUnlessPermit,
            vec![
                constant_node(PolicyResult::NotApplicable),
                constant_node(PolicyResult::IndeterminateDeny),
            ],
        );
        assert_eq!(run(set), PolicyResult::Deny);
    }

    #[test]
    fn deny_unless_permit_finds_permit() {
        let set = set_of(
            CombinationLogic::DenyUnlessPermit,
            vec![
                constant_node(PolicyResult::Deny),
                constant_node(PolicyResult::Permit),
            ],
        );
        assert_eq!(run(set), PolicyResult::Permit);
    }

    #[test]
    fn strict_unless_logic_aborts_on_first_invalid() {
        let mut set = set_of(
            CombinationLogic::DenyUnlessPermit,
            vec![
                constant_node(PolicyResult::NotApplicable),
                constant_node(PolicyResult::Permit),
            ],
        );
        set.strict_unless_logic = true;
        assert_eq!(run(set), PolicyResult::IndeterminateDenyPermit);
    }

    #[test]
    fn permit_unless_deny_lenient_scenario() {
        // Spec scenario: [INDETERMINATE_PERMIT, NOT_APPLICABLE], strict
        // disabled: both are invalid but the fallback is PERMIT.
        let set = set_of(
            CombinationLogic::PermitUnlessDeny,
            vec![
                constant_node(PolicyResult::IndeterminatePermit),
                constant_node(PolicyResult::NotApplicable),
            ],
        );
        assert_eq!(run(set), PolicyResult::Permit);
    }

    #[test]
    fn permit_unless_deny_short_circuits_on_deny() {
        let set = set_of(
            CombinationLogic::PermitUnlessDeny,
            vec![
                constant_node(PolicyResult::NotApplicable),
                constant_node(PolicyResult::Deny),
            ],
        );
        assert_eq!(run(set), PolicyResult::Deny);
    }

    #[test]
    fn first_applicable_respects_priority_order() {
        // Declared out of order; priorities force [NA, DENY, PERMIT].
        let mut set = PolicySet::new(CombinationLogic::FirstApplicable);
        set.relationships = vec![
            relationship(constant_node(PolicyResult::Permit)).priority(1),
            relationship(constant_node(PolicyResult::NotApplicable)).priority(3),
            relationship(constant_node(PolicyResult::Deny)).priority(2),
        ];
        assert_eq!(run(set), PolicyResult::Deny);
    }

    #[test]
    fn equal_priorities_keep_declaration_order() {
        let set = set_of(
            CombinationLogic::FirstApplicable,
            vec![
                constant_node(PolicyResult::Deny),
                constant_node(PolicyResult::Permit),
            ],
        );
        assert_eq!(run(set), PolicyResult::Deny);
    }

    #[test]
    fn first_applicable_keeps_running_indeterminate_on_missing_ref() {
        let mut set = PolicySet::new(CombinationLogic::FirstApplicable);
        set.relationships = vec![
            PolicyRelationship::new(RefOr::Ref(EntityRef::new(EntityKind::Policy, "ghost"))),
            relationship(constant_node(PolicyResult::NotApplicable)),
        ];
        assert_eq!(run(set), PolicyResult::IndeterminateDenyPermit);

        // An applicable result later in the list overwrites it.
        let mut set = PolicySet::new(CombinationLogic::FirstApplicable);
        set.relationships = vec![
            PolicyRelationship::new(RefOr::Ref(EntityRef::new(EntityKind::Policy, "ghost"))),
            relationship(constant_node(PolicyResult::Permit)),
        ];
        assert_eq!(run(set), PolicyResult::Permit);
    }

    #[test]
    fn missing_child_aborts_other_logics() {
        for logic in [
            CombinationLogic::DenyOverrides,
            CombinationLogic::PermitOverrides,
            CombinationLogic::DenyUnlessPermit,
            CombinationLogic::PermitUnlessDeny,
            CombinationLogic::OnlyOneApplicable,
        ] {
            let mut set = PolicySet::new(logic);
            set.relationships = vec![
                PolicyRelationship::new(RefOr::Ref(EntityRef::new(EntityKind::Policy, "ghost"))),
                relationship(constant_node(PolicyResult::Deny)),
            ];
            assert_eq!(
                run(set),
                PolicyResult::IndeterminateDenyPermit,
                "logic {logic:?}"
            );
        }
    }

    #[test]
    fn only_one_applicable_scenarios() {
        let set = set_of(
            CombinationLogic::OnlyOneApplicable,
            vec![
                constant_node(PolicyResult::Permit),
                constant_node(PolicyResult::Deny),
            ],
        );
        assert_eq!(run(set), PolicyResult::IndeterminateDenyPermit);

        let set = set_of(
            CombinationLogic::OnlyOneApplicable,
            vec![
                constant_node(PolicyResult::NotApplicable),
                constant_node(PolicyResult::Deny),
            ],
        );
        assert_eq!(run(set), PolicyResult::Deny);

        let set = set_of(
            CombinationLogic::OnlyOneApplicable,
            vec![constant_node(PolicyResult::NotApplicable)],
        );
        assert_eq!(run(set), PolicyResult::NotApplicable);
    }

    #[test]
    fn constraint_false_skips_entry() {
        let mut set = PolicySet::new(CombinationLogic::DenyOverrides);
        set.relationships = vec![
            relationship(constant_node(PolicyResult::Deny))
                .constraint(const_condition(Some(false))),
            relationship(constant_node(PolicyResult::Permit)),
        ];
        assert_eq!(run(set), PolicyResult::Permit);
    }

    #[test]
    fn null_constraint_skip_depends_on_leniency() {
        // Lenient (default): the entry is simply skipped.
        let mut set = PolicySet::new(CombinationLogic::DenyOverrides);
        set.relationships = vec![
            relationship(constant_node(PolicyResult::Deny)).constraint(const_condition(None)),
            relationship(constant_node(PolicyResult::Permit)),
        ];
        assert_eq!(run(set), PolicyResult::Permit);

        // Strict: the skip also contributes an indeterminate marker.
        let mut set = PolicySet::new(CombinationLogic::DenyOverrides);
        set.base.lenient_constraints = false;
        set.relationships = vec![
            relationship(constant_node(PolicyResult::Deny)).constraint(const_condition(None)),
            relationship(constant_node(PolicyResult::Permit)),
        ];
        assert_eq!(run(set), PolicyResult::IndeterminateDenyPermit);
    }
}
