use crate::entity::{Action, CatalogEntity, Condition, RefOr};
use std::collections::BTreeSet;
use verdict_types::{
    ids, ActionExecutionStrategy, CombinationLogic, Effect, EntityRef, ExecutionMode, Identity,
    PolicyResult,
};

/// Construction defaults for the flag fields every node carries.
///
/// The built-in defaults are lenient: null constraints fall back to
/// NOT_APPLICABLE and action failures are swallowed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeDefaults {
    pub lenient_constraints: bool,
    pub ignore_errors: bool,
    pub action_strategy: ActionExecutionStrategy,
}

impl Default for NodeDefaults {
    fn default() -> Self {
        Self {
            lenient_constraints: true,
            ignore_errors: true,
            action_strategy: ActionExecutionStrategy::RunAll,
        }
    }
}

/// Fields shared by every policy node variant.
#[derive(Clone, Debug)]
pub struct PolicyBase {
    pub identity: Option<Identity>,
    pub description: Option<String>,
    pub labels: Vec<String>,

    /// Top-level constraint, checked only when the node is the root of the
    /// current evaluation path.
    pub constraint: Option<RefOr<dyn Condition>>,

    pub actions: Vec<ActionRelationship>,

    /// Null constraint results yield NOT_APPLICABLE instead of an
    /// indeterminate failure.
    pub lenient_constraints: bool,
    pub action_strategy: ActionExecutionStrategy,
    pub ignore_errors: bool,
    pub priority: i32,
}

impl Default for PolicyBase {
    fn default() -> Self {
        Self::with_defaults(&NodeDefaults::default())
    }
}

impl PolicyBase {
    pub fn with_defaults(defaults: &NodeDefaults) -> Self {
        Self {
            identity: None,
            description: None,
            labels: Vec::new(),
            constraint: None,
            actions: Vec::new(),
            lenient_constraints: defaults.lenient_constraints,
            action_strategy: defaults.action_strategy,
            ignore_errors: defaults.ignore_errors,
            priority: 0,
        }
    }
}

/// Atomic policy: one condition, one target effect.
#[derive(Clone, Debug)]
pub struct Policy {
    pub base: PolicyBase,
    pub condition: RefOr<dyn Condition>,
    pub effect: Effect,
    /// When set, a false condition yields the negated effect instead of
    /// NOT_APPLICABLE.
    pub strict_target_effect: bool,
}

impl Policy {
    pub fn new(effect: Effect, condition: RefOr<dyn Condition>) -> Self {
        Self {
            base: PolicyBase::default(),
            condition,
            effect,
            strict_target_effect: false,
        }
    }
}

/// Composite policy combining child results through one of the six
/// combination logics.
#[derive(Clone, Debug)]
pub struct PolicySet {
    pub base: PolicyBase,
    pub relationships: Vec<PolicyRelationship>,
    pub logic: CombinationLogic,

    /// Run each child's actions right after its evaluation.
    pub run_child_actions: bool,
    /// DENY_UNLESS_PERMIT / PERMIT_UNLESS_DENY abort on the first invalid
    /// contribution instead of continuing.
    pub strict_unless_logic: bool,
    /// A failed child action phase escalates that child's contribution to
    /// INDETERMINATE_DENY_PERMIT.
    pub indeterminate_on_action_fail: bool,
    /// Bypass the decision cache for this node, both read and write.
    pub skip_cache: bool,
}

impl PolicySet {
    pub fn new(logic: CombinationLogic) -> Self {
        Self {
            base: PolicyBase::default(),
            relationships: Vec::new(),
            logic,
            run_child_actions: false,
            strict_unless_logic: false,
            indeterminate_on_action_fail: false,
            skip_cache: false,
        }
    }
}

/// Constant node, used as a terminal or for testing.
#[derive(Clone, Debug)]
pub struct PolicyDefault {
    pub base: PolicyBase,
    pub result: PolicyResult,
}

impl PolicyDefault {
    pub fn new(result: PolicyResult) -> Self {
        Self {
            base: PolicyBase::default(),
            result,
        }
    }
}

/// One child entry of a policy set.
#[derive(Clone, Debug)]
pub struct PolicyRelationship {
    pub policy: RefOr<PolicyNode>,
    pub constraint: Option<RefOr<dyn Condition>>,
    pub priority: i32,
    /// Combined with the set's `run_child_actions`: both must be true for
    /// the child's actions to run during combination.
    pub run_action: bool,
}

impl PolicyRelationship {
    pub fn new(policy: RefOr<PolicyNode>) -> Self {
        Self {
            policy,
            constraint: None,
            priority: 0,
            run_action: true,
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn constraint(mut self, constraint: RefOr<dyn Condition>) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn run_action(mut self, run_action: bool) -> Self {
        self.run_action = run_action;
        self
    }
}

/// One entry of a node's action list.
#[derive(Clone, Debug)]
pub struct ActionRelationship {
    pub action: RefOr<dyn Action>,
    pub constraint: Option<RefOr<dyn Condition>>,
    pub priority: i32,
    /// When present and non-empty, replaces the `is_success` eligibility
    /// fallback with an explicit result filter.
    pub execution_modes: Option<BTreeSet<ExecutionMode>>,
}

impl ActionRelationship {
    pub fn new(action: RefOr<dyn Action>) -> Self {
        Self {
            action,
            constraint: None,
            priority: 0,
            execution_modes: None,
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn constraint(mut self, constraint: RefOr<dyn Condition>) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn modes(mut self, modes: impl IntoIterator<Item = ExecutionMode>) -> Self {
        self.execution_modes = Some(modes.into_iter().collect());
        self
    }
}

/// The closed set of evaluable policy variants.
#[derive(Clone, Debug)]
pub enum PolicyNode {
    Policy(Policy),
    Set(PolicySet),
    Default(PolicyDefault),
}

impl PolicyNode {
    pub fn base(&self) -> &PolicyBase {
        match self {
            PolicyNode::Policy(p) => &p.base,
            PolicyNode::Set(s) => &s.base,
            PolicyNode::Default(d) => &d.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut PolicyBase {
        match self {
            PolicyNode::Policy(p) => &mut p.base,
            PolicyNode::Set(s) => &mut s.base,
            PolicyNode::Default(d) => &mut d.base,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.base().identity.as_ref()
    }

    /// Identity usable as a cache key: present and non-blank.
    pub fn cache_identity(&self) -> Option<&Identity> {
        self.identity().filter(|i| !i.is_blank())
    }

    /// Only policy sets may opt out of caching.
    pub fn skip_cache(&self) -> bool {
        match self {
            PolicyNode::Set(s) => s.skip_cache,
            _ => false,
        }
    }

    /// Audit path segment: the identity key, or a variant token for
    /// anonymous nodes.
    pub fn path_segment(&self) -> String {
        match self.cache_identity() {
            Some(identity) => identity.key(),
            None => match self {
                PolicyNode::Policy(_) => ids::SEGMENT_POLICY.to_string(),
                PolicyNode::Set(_) => ids::SEGMENT_POLICY_SET.to_string(),
                PolicyNode::Default(_) => ids::SEGMENT_POLICY_DEFAULT.to_string(),
            },
        }
    }

    // Fluent helpers used when assembling catalogs by hand.

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.base_mut().identity = Some(Identity::new(id));
        self
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.base_mut().identity = Some(identity);
        self
    }

    pub fn with_labels(mut self, labels: impl IntoIterator<Item = String>) -> Self {
        self.base_mut().labels = labels.into_iter().collect();
        self
    }

    pub fn with_constraint(mut self, constraint: RefOr<dyn Condition>) -> Self {
        self.base_mut().constraint = Some(constraint);
        self
    }

    pub fn with_actions(mut self, actions: Vec<ActionRelationship>) -> Self {
        self.base_mut().actions = actions;
        self
    }

    pub fn with_action_strategy(mut self, strategy: ActionExecutionStrategy) -> Self {
        self.base_mut().action_strategy = strategy;
        self
    }

    pub fn with_lenient_constraints(mut self, lenient: bool) -> Self {
        self.base_mut().lenient_constraints = lenient;
        self
    }

    pub fn with_ignore_errors(mut self, ignore: bool) -> Self {
        self.base_mut().ignore_errors = ignore;
        self
    }
}

impl From<Policy> for PolicyNode {
    fn from(p: Policy) -> Self {
        PolicyNode::Policy(p)
    }
}

impl From<PolicySet> for PolicyNode {
    fn from(s: PolicySet) -> Self {
        PolicyNode::Set(s)
    }
}

impl From<PolicyDefault> for PolicyNode {
    fn from(d: PolicyDefault) -> Self {
        PolicyNode::Default(d)
    }
}

impl CatalogEntity for PolicyNode {
    fn identity(&self) -> Option<&Identity> {
        self.base().identity.as_ref()
    }

    fn labels(&self) -> &[String] {
        &self.base().labels
    }

    /// Direct `Ref` edges only. The validator walks inline values
    /// structurally, so this does not recurse.
    fn child_refs(&self) -> Vec<EntityRef> {
        let mut refs = Vec::new();
        let base = self.base();
        if let Some(c) = &base.constraint {
            refs.extend(c.as_ref_descriptor().cloned());
        }
        for rel in &base.actions {
            refs.extend(rel.action.as_ref_descriptor().cloned());
            if let Some(c) = &rel.constraint {
                refs.extend(c.as_ref_descriptor().cloned());
            }
        }
        match self {
            PolicyNode::Policy(p) => {
                refs.extend(p.condition.as_ref_descriptor().cloned());
            }
            PolicyNode::Set(s) => {
                for rel in &s.relationships {
                    refs.extend(rel.policy.as_ref_descriptor().cloned());
                    if let Some(c) = &rel.constraint {
                        refs.extend(c.as_ref_descriptor().cloned());
                    }
                }
            }
            PolicyNode::Default(_) => {}
        }
        refs
    }
}
