use crate::entity::{Action, Condition, RefOr, Resolver, Variable};
use crate::error::CatalogError;
use crate::policy::PolicyNode;
use crate::registry::Registry;
use crate::validate;
use std::fmt;
use std::sync::Arc;
use verdict_types::{EntityKind, Identity, LabelLogic, Version};

/// The validated, immutable entity repository.
///
/// Only [`CatalogBuilder::build`] produces one, and only after the
/// missing-reference and cycle checks pass.
pub struct Catalog {
    pub(crate) policies: Registry<PolicyNode>,
    pub(crate) conditions: Registry<dyn Condition>,
    pub(crate) actions: Registry<dyn Action>,
    pub(crate) variables: Registry<dyn Variable>,
    pub(crate) resolvers: Registry<dyn Resolver>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn policy(&self, id: &str, version: Option<&Version>) -> Option<Arc<PolicyNode>> {
        self.policies.get(id, version)
    }

    pub fn condition(&self, id: &str, version: Option<&Version>) -> Option<Arc<dyn Condition>> {
        self.conditions.get(id, version)
    }

    pub fn action(&self, id: &str, version: Option<&Version>) -> Option<Arc<dyn Action>> {
        self.actions.get(id, version)
    }

    pub fn variable(&self, id: &str, version: Option<&Version>) -> Option<Arc<dyn Variable>> {
        self.variables.get(id, version)
    }

    pub fn resolver(&self, id: &str, version: Option<&Version>) -> Option<Arc<dyn Resolver>> {
        self.resolvers.get(id, version)
    }

    pub fn all_policies(&self) -> Vec<Arc<PolicyNode>> {
        self.policies.all()
    }

    pub fn all_conditions(&self) -> Vec<Arc<dyn Condition>> {
        self.conditions.all()
    }

    pub fn all_actions(&self) -> Vec<Arc<dyn Action>> {
        self.actions.all()
    }

    pub fn all_variables(&self) -> Vec<Arc<dyn Variable>> {
        self.variables.all()
    }

    pub fn all_resolvers(&self) -> Vec<Arc<dyn Resolver>> {
        self.resolvers.all()
    }

    /// Every policy registration with its id and registered version slot.
    pub fn policy_entries(
        &self,
    ) -> impl Iterator<Item = (&str, Option<&Version>, &Arc<PolicyNode>)> {
        self.policies.entries()
    }

    pub fn policies_by_labels(
        &self,
        labels: &[String],
        logic: LabelLogic,
    ) -> Result<Vec<Arc<PolicyNode>>, CatalogError> {
        if labels.is_empty() {
            return Err(CatalogError::EmptyLabelQuery);
        }
        Ok(self.policies.search_by_labels(labels, logic))
    }

    pub fn conditions_by_labels(
        &self,
        labels: &[String],
        logic: LabelLogic,
    ) -> Result<Vec<Arc<dyn Condition>>, CatalogError> {
        if labels.is_empty() {
            return Err(CatalogError::EmptyLabelQuery);
        }
        Ok(self.conditions.search_by_labels(labels, logic))
    }

    pub fn actions_by_labels(
        &self,
        labels: &[String],
        logic: LabelLogic,
    ) -> Result<Vec<Arc<dyn Action>>, CatalogError> {
        if labels.is_empty() {
            return Err(CatalogError::EmptyLabelQuery);
        }
        Ok(self.actions.search_by_labels(labels, logic))
    }

    // Single-step resolution of reference-or-inline fields.

    pub fn resolve_policy(&self, field: &RefOr<PolicyNode>) -> Option<Arc<PolicyNode>> {
        match field {
            RefOr::Value(node) => Some(Arc::clone(node)),
            RefOr::Ref(r) => self.policies.get(&r.id, r.version.as_ref()),
        }
    }

    pub fn resolve_condition(&self, field: &RefOr<dyn Condition>) -> Option<Arc<dyn Condition>> {
        match field {
            RefOr::Value(condition) => Some(Arc::clone(condition)),
            RefOr::Ref(r) => self.conditions.get(&r.id, r.version.as_ref()),
        }
    }

    pub fn resolve_action(&self, field: &RefOr<dyn Action>) -> Option<Arc<dyn Action>> {
        match field {
            RefOr::Value(action) => Some(Arc::clone(action)),
            RefOr::Ref(r) => self.actions.get(&r.id, r.version.as_ref()),
        }
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("policies", &self.policies.len())
            .field("conditions", &self.conditions.len())
            .field("actions", &self.actions.len())
            .field("variables", &self.variables.len())
            .field("resolvers", &self.resolvers.len())
            .finish()
    }
}

/// Accumulates registrations, then validates the whole graph in `build`.
#[derive(Default)]
pub struct CatalogBuilder {
    policies: Registry<PolicyNode>,
    conditions: Registry<dyn Condition>,
    actions: Registry<dyn Action>,
    variables: Registry<dyn Variable>,
    resolvers: Registry<dyn Resolver>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn policy(mut self, node: PolicyNode) -> Result<Self, CatalogError> {
        let identity = required_identity(node.identity(), EntityKind::Policy)?;
        self.policies.register(&identity, Arc::new(node));
        Ok(self)
    }

    pub fn condition(mut self, condition: Arc<dyn Condition>) -> Result<Self, CatalogError> {
        let identity = required_identity(condition.identity(), EntityKind::Condition)?;
        self.conditions.register(&identity, condition);
        Ok(self)
    }

    pub fn action(mut self, action: Arc<dyn Action>) -> Result<Self, CatalogError> {
        let identity = required_identity(action.identity(), EntityKind::Action)?;
        self.actions.register(&identity, action);
        Ok(self)
    }

    pub fn variable(mut self, variable: Arc<dyn Variable>) -> Result<Self, CatalogError> {
        let identity = required_identity(variable.identity(), EntityKind::Variable)?;
        self.variables.register(&identity, variable);
        Ok(self)
    }

    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Result<Self, CatalogError> {
        let identity = required_identity(resolver.identity(), EntityKind::Resolver)?;
        self.resolvers.register(&identity, resolver);
        Ok(self)
    }

    /// Run the one-time integrity pass and seal the catalog.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        let catalog = Catalog {
            policies: self.policies,
            conditions: self.conditions,
            actions: self.actions,
            variables: self.variables,
            resolvers: self.resolvers,
        };
        validate::validate(&catalog)?;
        Ok(catalog)
    }
}

fn required_identity(
    identity: Option<&Identity>,
    kind: EntityKind,
) -> Result<Identity, CatalogError> {
    match identity {
        Some(i) if !i.is_blank() => Ok(i.clone()),
        _ => Err(CatalogError::BlankId(kind)),
    }
}
