use verdict::{
    ActionExecutionStrategy, ActionRelationship, Catalog, CatalogError, CombinationLogic,
    DecisionEngine, EntityKind, EntityRef, EvaluationContext, Identity, PolicyNode,
    PolicyRelationship, PolicyResult, PolicySet, RefOr, Version,
};
use verdict_test_util::{
    catalog_with, constant_node, deny_policy, permit_policy, recording_context, relationship,
    save_action, set_of,
};

fn decide_root(children: Vec<PolicyNode>, logic: CombinationLogic) -> PolicyResult {
    let root = PolicyNode::from(set_of(logic, children)).with_id("root");
    let engine = DecisionEngine::new(catalog_with(vec![root]));
    let mut ctx = EvaluationContext::new();
    engine.decide("root", None, &mut ctx).result
}

#[test]
fn deny_overrides_prefers_deny() {
    let result = decide_root(
        vec![
            constant_node(PolicyResult::Permit),
            constant_node(PolicyResult::Deny),
        ],
        CombinationLogic::DenyOverrides,
    );
    assert_eq!(result, PolicyResult::Deny);
}

#[test]
fn permit_unless_deny_falls_back_to_permit() {
    let result = decide_root(
        vec![
            constant_node(PolicyResult::IndeterminatePermit),
            constant_node(PolicyResult::NotApplicable),
        ],
        CombinationLogic::PermitUnlessDeny,
    );
    assert_eq!(result, PolicyResult::Permit);
}

#[test]
fn first_applicable_follows_priority_not_declaration() {
    let mut set = PolicySet::new(CombinationLogic::FirstApplicable);
    set.relationships = vec![
        relationship(constant_node(PolicyResult::Permit)).priority(1),
        relationship(constant_node(PolicyResult::NotApplicable)).priority(3),
        relationship(constant_node(PolicyResult::Deny)).priority(2),
    ];
    let root = PolicyNode::from(set).with_id("root");
    let engine = DecisionEngine::new(catalog_with(vec![root]));
    let mut ctx = EvaluationContext::new();
    assert_eq!(engine.decide("root", None, &mut ctx).result, PolicyResult::Deny);
}

#[test]
fn only_one_applicable_rejects_a_second_result() {
    let result = decide_root(
        vec![
            constant_node(PolicyResult::Permit),
            constant_node(PolicyResult::Deny),
        ],
        CombinationLogic::OnlyOneApplicable,
    );
    assert_eq!(result, PolicyResult::IndeterminateDenyPermit);
}

#[test]
fn rollback_discards_partial_writes() {
    let root = permit_policy("root")
        .with_action_strategy(ActionExecutionStrategy::RollbackOnFailure)
        .with_actions(vec![
            ActionRelationship::new(save_action("foo", "bar4")),
            ActionRelationship::new(save_action("foo", "bar5")),
            ActionRelationship::new(RefOr::Ref(EntityRef::new(EntityKind::Action, "missing"))),
        ]);
    // Bypass the builder: a registered node referencing a missing action
    // would be rejected at construction, so decide the node directly.
    let engine = DecisionEngine::new(catalog_with(Vec::new()));
    let mut ctx = EvaluationContext::new();
    let decision = engine.decide_node(&root, &mut ctx);

    assert_eq!(decision.result, PolicyResult::Permit);
    assert!(!decision.actions_succeeded);
    assert!(!ctx.data().contains("foo"));
    assert!(ctx.data().is_empty());
}

#[test]
fn self_referencing_set_fails_construction() {
    let mut set = PolicySet::new(CombinationLogic::DenyOverrides);
    set.relationships = vec![PolicyRelationship::new(RefOr::Ref(EntityRef::new(
        EntityKind::Policy,
        "loop",
    )))];
    let err = Catalog::builder()
        .policy(PolicyNode::from(set).with_id("loop"))
        .unwrap()
        .build()
        .unwrap_err();
    assert!(matches!(err, CatalogError::CircularReferences(_)));
}

#[test]
fn decisions_are_cached_within_a_context() {
    let root = PolicyNode::from(set_of(
        CombinationLogic::DenyOverrides,
        vec![constant_node(PolicyResult::Deny)],
    ))
    .with_id("root");
    let engine = DecisionEngine::new(catalog_with(vec![root]));
    let (mut ctx, sink) = recording_context();

    assert_eq!(engine.decide("root", None, &mut ctx).result, PolicyResult::Deny);
    assert_eq!(engine.decide("root", None, &mut ctx).result, PolicyResult::Deny);

    let events = sink.events();
    assert!(events.iter().any(|e| e.from_cache && e.path == "root"));
}

#[test]
fn unversioned_lookup_takes_the_highest_version() {
    let v1 = PolicyNode::from(verdict::Policy::new(
        verdict::Effect::Permit,
        verdict_test_util::const_condition(Some(true)),
    ))
    .with_identity(Identity::versioned("p", Version::new(1, 0, 0)));
    let v2 = deny_policy("p").with_identity(Identity::versioned("p", Version::new(2, 0, 0)));
    let engine = DecisionEngine::new(catalog_with(vec![v1, v2]));

    let mut ctx = EvaluationContext::new();
    assert_eq!(engine.decide("p", None, &mut ctx).result, PolicyResult::Deny);

    let mut ctx = EvaluationContext::new();
    assert_eq!(
        engine
            .decide("p", Some(&Version::new(1, 0, 0)), &mut ctx)
            .result,
        PolicyResult::Permit
    );
    let mut ctx = EvaluationContext::new();
    assert_eq!(
        engine
            .decide("p", Some(&Version::new(3, 0, 0)), &mut ctx)
            .result,
        PolicyResult::IndeterminateDenyPermit
    );
}

#[test]
fn referenced_children_resolve_through_the_catalog() {
    let mut set = PolicySet::new(CombinationLogic::DenyOverrides);
    set.relationships = vec![
        PolicyRelationship::new(RefOr::Ref(EntityRef::new(EntityKind::Policy, "leaf-permit"))),
        PolicyRelationship::new(RefOr::Ref(EntityRef::new(EntityKind::Policy, "leaf-deny"))),
    ];
    let engine = DecisionEngine::new(catalog_with(vec![
        PolicyNode::from(set).with_id("root"),
        permit_policy("leaf-permit"),
        deny_policy("leaf-deny"),
    ]));
    let (mut ctx, sink) = recording_context();
    assert_eq!(engine.decide("root", None, &mut ctx).result, PolicyResult::Deny);

    // Child evaluations are recorded under the parent's path.
    let events = sink.events();
    assert!(events.iter().any(|e| e.path == "root/leaf-permit"));
    assert!(events.iter().any(|e| e.path == "root/leaf-deny"));
}

#[test]
fn child_action_failure_escalates_when_requested() {
    let noisy_child = constant_node(PolicyResult::Permit)
        .with_actions(vec![ActionRelationship::new(
            verdict_test_util::error_action("boom"),
        )])
        .with_ignore_errors(false);

    let mut set = PolicySet::new(CombinationLogic::PermitOverrides);
    set.run_child_actions = true;
    set.indeterminate_on_action_fail = true;
    set.relationships = vec![relationship(noisy_child)];

    let root = PolicyNode::from(set).with_id("root");
    let engine = DecisionEngine::new(catalog_with(vec![root]));
    let mut ctx = EvaluationContext::new();
    assert_eq!(
        engine.decide("root", None, &mut ctx).result,
        PolicyResult::IndeterminateDenyPermit
    );
}
