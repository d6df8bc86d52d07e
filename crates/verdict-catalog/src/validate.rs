//! One-time construction integrity pass.
//!
//! Builds a directed reference graph over every registered entity, then
//! rejects the catalog on dangling references or cycles. Inline values are
//! not references (they cannot dangle) but they are walked recursively, so
//! a cycle introduced purely through embedded definitions is still caught.

use crate::catalog::Catalog;
use crate::entity::{Action, Condition, RefOr};
use crate::error::CatalogError;
use crate::policy::PolicyNode;
use std::collections::{BTreeMap, BTreeSet};
use verdict_types::{EntityKind, EntityRef, Version};

pub(crate) fn validate(catalog: &Catalog) -> Result<(), CatalogError> {
    let mut graph = Graph::default();
    graph.add_catalog(catalog);

    if !graph.missing.is_empty() {
        return Err(CatalogError::MissingReferences(
            graph.missing.into_iter().collect(),
        ));
    }
    graph.check_cycles()
}

/// Graph node address: a registration slot, or an anonymous inline value.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum GraphKey {
    Named(EntityKind, String, Option<Version>),
    Anon(usize),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

#[derive(Default)]
struct Graph {
    edges: BTreeMap<GraphKey, Vec<GraphKey>>,
    labels: BTreeMap<GraphKey, String>,
    missing: BTreeSet<String>,
    next_anon: usize,
}

impl Graph {
    fn add_catalog(&mut self, catalog: &Catalog) {
        for (id, version, node) in catalog.policies.entries() {
            let key = self.named(EntityKind::Policy, id, version.copied());
            self.walk_policy(catalog, &key, node);
        }
        for (id, version, condition) in catalog.conditions.entries() {
            let key = self.named(EntityKind::Condition, id, version.copied());
            for r in condition.child_refs() {
                self.ref_edge(catalog, &key, &r);
            }
        }
        for (id, version, action) in catalog.actions.entries() {
            let key = self.named(EntityKind::Action, id, version.copied());
            for r in action.child_refs() {
                self.ref_edge(catalog, &key, &r);
            }
        }
        for (id, version, variable) in catalog.variables.entries() {
            let key = self.named(EntityKind::Variable, id, version.copied());
            for r in variable.child_refs() {
                self.ref_edge(catalog, &key, &r);
            }
        }
        for (id, version, resolver) in catalog.resolvers.entries() {
            let key = self.named(EntityKind::Resolver, id, version.copied());
            for r in resolver.child_refs() {
                self.ref_edge(catalog, &key, &r);
            }
        }
    }

    fn walk_policy(&mut self, catalog: &Catalog, from: &GraphKey, node: &PolicyNode) {
        let base = node.base();
        if let Some(constraint) = &base.constraint {
            self.condition_field(catalog, from, constraint);
        }
        for rel in &base.actions {
            self.action_field(catalog, from, &rel.action);
            if let Some(constraint) = &rel.constraint {
                self.condition_field(catalog, from, constraint);
            }
        }
        match node {
            PolicyNode::Policy(p) => {
                self.condition_field(catalog, from, &p.condition);
            }
            PolicyNode::Set(s) => {
                for rel in &s.relationships {
                    self.policy_field(catalog, from, &rel.policy);
                    if let Some(constraint) = &rel.constraint {
                        self.condition_field(catalog, from, constraint);
                    }
                }
            }
            PolicyNode::Default(_) => {}
        }
    }

    fn policy_field(&mut self, catalog: &Catalog, from: &GraphKey, field: &RefOr<PolicyNode>) {
        match field {
            RefOr::Ref(r) => self.ref_edge(catalog, from, r),
            RefOr::Value(node) => {
                let anon = self.anon("inline policy");
                self.edge(from.clone(), anon.clone());
                self.walk_policy(catalog, &anon, node);
            }
        }
    }

    fn condition_field(
        &mut self,
        catalog: &Catalog,
        from: &GraphKey,
        field: &RefOr<dyn Condition>,
    ) {
        match field {
            RefOr::Ref(r) => self.ref_edge(catalog, from, r),
            RefOr::Value(condition) => {
                let anon = self.anon("inline condition");
                self.edge(from.clone(), anon.clone());
                for r in condition.child_refs() {
                    self.ref_edge(catalog, &anon, &r);
                }
            }
        }
    }

    fn action_field(&mut self, catalog: &Catalog, from: &GraphKey, field: &RefOr<dyn Action>) {
        match field {
            RefOr::Ref(r) => self.ref_edge(catalog, from, r),
            RefOr::Value(action) => {
                let anon = self.anon("inline action");
                self.edge(from.clone(), anon.clone());
                for r in action.child_refs() {
                    self.ref_edge(catalog, &anon, &r);
                }
            }
        }
    }

    /// Resolve a reference through the version law and add the edge, or
    /// record it as dangling.
    fn ref_edge(&mut self, catalog: &Catalog, from: &GraphKey, r: &EntityRef) {
        let version = r.version.as_ref();
        let slot = match r.kind {
            EntityKind::Policy => catalog.policies.resolve(&r.id, version).map(|(s, _)| s),
            EntityKind::Condition => catalog.conditions.resolve(&r.id, version).map(|(s, _)| s),
            EntityKind::Action => catalog.actions.resolve(&r.id, version).map(|(s, _)| s),
            EntityKind::Variable => catalog.variables.resolve(&r.id, version).map(|(s, _)| s),
            EntityKind::Resolver => catalog.resolvers.resolve(&r.id, version).map(|(s, _)| s),
        };
        match slot {
            Some(slot) => {
                let to = self.named(r.kind, &r.id, slot);
                self.edge(from.clone(), to);
            }
            None => {
                self.missing.insert(r.to_string());
            }
        }
    }

    fn named(&mut self, kind: EntityKind, id: &str, version: Option<Version>) -> GraphKey {
        let key = GraphKey::Named(kind, id.to_string(), version);
        let label = match &version {
            Some(v) => format!("{kind}:{id}:{v}"),
            None => format!("{kind}:{id}"),
        };
        self.ensure(key.clone(), label);
        key
    }

    fn anon(&mut self, what: &str) -> GraphKey {
        let key = GraphKey::Anon(self.next_anon);
        self.next_anon += 1;
        self.ensure(key.clone(), format!("{what} #{}", self.next_anon));
        key
    }

    fn ensure(&mut self, key: GraphKey, label: String) {
        self.edges.entry(key.clone()).or_default();
        self.labels.entry(key).or_insert(label);
    }

    fn edge(&mut self, from: GraphKey, to: GraphKey) {
        self.ensure(to.clone(), String::new());
        self.edges.entry(from).or_default().push(to);
    }

    fn label(&self, key: &GraphKey) -> String {
        match self.labels.get(key) {
            Some(label) if !label.is_empty() => label.clone(),
            _ => format!("{key:?}"),
        }
    }

    /// Depth-first traversal with white/gray/black coloring. A back-edge
    /// to a gray node is a cycle; the error carries the offending path.
    fn check_cycles(&self) -> Result<(), CatalogError> {
        let mut color: BTreeMap<&GraphKey, Color> =
            self.edges.keys().map(|k| (k, Color::White)).collect();
        let mut stack: Vec<&GraphKey> = Vec::new();

        for key in self.edges.keys() {
            if color.get(key) == Some(&Color::White) {
                self.visit(key, &mut color, &mut stack)?;
            }
        }
        Ok(())
    }

    fn visit<'a>(
        &'a self,
        key: &'a GraphKey,
        color: &mut BTreeMap<&'a GraphKey, Color>,
        stack: &mut Vec<&'a GraphKey>,
    ) -> Result<(), CatalogError> {
        color.insert(key, Color::Gray);
        stack.push(key);

        if let Some(nexts) = self.edges.get(key) {
            for next in nexts {
                match color.get(next).copied().unwrap_or(Color::White) {
                    Color::Gray => {
                        let start = stack.iter().position(|k| *k == next).unwrap_or(0);
                        let mut cycle: Vec<String> =
                            stack[start..].iter().map(|k| self.label(k)).collect();
                        cycle.push(self.label(next));
                        return Err(CatalogError::CircularReferences(cycle));
                    }
                    Color::White => self.visit(next, color, stack)?,
                    Color::Black => {}
                }
            }
        }

        stack.pop();
        color.insert(key, Color::Black);
        Ok(())
    }
}
