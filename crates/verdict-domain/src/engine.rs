//! Entry point tying evaluation and the action phase together, plus the
//! bulk query surface over a catalog.

use crate::{actions, eval};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;
use verdict_catalog::{Catalog, CatalogError, PolicyNode};
use verdict_context::EvaluationContext;
use verdict_types::{EntityKind, EntityRef, LabelLogic, PolicyResult, Version};

/// One decision: the evaluation result and whether the subsequent action
/// phase succeeded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub result: PolicyResult,
    pub actions_succeeded: bool,
}

/// Synchronous decision facade over a validated catalog.
///
/// The engine itself is stateless; all per-request state lives in the
/// [`EvaluationContext`] the caller passes in. Bulk queries thread one
/// context through every entry, so decisions within a batch share the
/// cache and the data store.
pub struct DecisionEngine {
    catalog: Catalog,
}

impl DecisionEngine {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Decide a node directly, bypassing the catalog lookup.
    pub fn decide_node(&self, node: &PolicyNode, ctx: &mut EvaluationContext) -> Decision {
        let result = eval::evaluate(node, ctx, &self.catalog);
        let actions_succeeded = actions::run_actions(node, result, ctx, &self.catalog);
        debug!(node = %node.path_segment(), ?result, actions_succeeded, "decided");
        Decision {
            result,
            actions_succeeded,
        }
    }

    /// Decide a registered policy by id, following the version lookup law.
    ///
    /// An unknown id is not an error at this boundary: it yields
    /// INDETERMINATE_DENY_PERMIT with a failed action phase and a failed
    /// event, the same downgrade every other evaluation failure gets.
    pub fn decide(
        &self,
        id: &str,
        version: Option<&Version>,
        ctx: &mut EvaluationContext,
    ) -> Decision {
        match self.catalog.policy(id, version) {
            Some(node) => self.decide_node(&node, ctx),
            None => {
                let key = key_of(id, version);
                ctx.scoped(key.clone(), |ctx| {
                    ctx.record_failure(
                        EntityKind::Policy,
                        Some(PolicyResult::IndeterminateDenyPermit),
                        format!("no policy registered under {key}"),
                    );
                });
                Decision {
                    result: PolicyResult::IndeterminateDenyPermit,
                    actions_succeeded: false,
                }
            }
        }
    }

    /// Decide several unversioned ids, keyed by id.
    pub fn decide_by_ids<I, S>(&self, ids: I, ctx: &mut EvaluationContext) -> BTreeMap<String, Decision>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ids.into_iter()
            .map(|id| {
                let id = id.as_ref();
                (id.to_string(), self.decide(id, None, ctx))
            })
            .collect()
    }

    /// Decide several versioned references, keyed by `id[:version]`.
    pub fn decide_by_refs(
        &self,
        refs: &[EntityRef],
        ctx: &mut EvaluationContext,
    ) -> BTreeMap<String, Decision> {
        refs.iter()
            .map(|r| {
                (
                    key_of(&r.id, r.version.as_ref()),
                    self.decide(&r.id, r.version.as_ref(), ctx),
                )
            })
            .collect()
    }

    /// Decide every policy matching a label query, keyed by identity key.
    ///
    /// An empty label list is a caller bug and is rejected rather than
    /// silently matching nothing.
    pub fn decide_by_labels(
        &self,
        labels: &[String],
        logic: LabelLogic,
        ctx: &mut EvaluationContext,
    ) -> Result<BTreeMap<String, Decision>, CatalogError> {
        let matched = self.catalog.policies_by_labels(labels, logic)?;
        Ok(matched
            .iter()
            .map(|node| (node.path_segment(), self.decide_node(node, ctx)))
            .collect())
    }

    /// Decide every registered policy, keyed by its registration slot.
    pub fn decide_all(&self, ctx: &mut EvaluationContext) -> BTreeMap<String, Decision> {
        self.catalog
            .policy_entries()
            .map(|(id, version, node)| (key_of(id, version), self.decide_node(node, ctx)))
            .collect()
    }
}

fn key_of(id: &str, version: Option<&Version>) -> String {
    match version {
        Some(v) => format!("{id}:{v}"),
        None => id.to_string(),
    }
}
