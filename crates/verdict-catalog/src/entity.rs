use crate::catalog::Catalog;
use crate::error::EvaluationError;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use verdict_context::EvaluationContext;
use verdict_types::{EntityRef, Identity};

/// Shared capability surface of everything a catalog stores.
///
/// `child_refs` reports the references an entity holds so the validator
/// can build the reference graph. Implementors must report every `Ref`
/// reachable inside their own value tree; inline policy nodes are walked
/// structurally by the validator itself.
pub trait CatalogEntity {
    fn identity(&self) -> Option<&Identity>;

    fn labels(&self) -> &[String] {
        &[]
    }

    fn child_refs(&self) -> Vec<EntityRef> {
        Vec::new()
    }
}

/// Tri-state gating condition. `Ok(None)` is the indeterminate outcome.
pub trait Condition: CatalogEntity + fmt::Debug + Send + Sync {
    fn check(
        &self,
        ctx: &mut EvaluationContext,
        catalog: &Catalog,
    ) -> Result<Option<bool>, EvaluationError>;
}

/// Side-effecting action run against the context's data store.
/// `Ok(false)` is a soft failure; `Err` is an execution error.
pub trait Action: CatalogEntity + fmt::Debug + Send + Sync {
    fn run(
        &self,
        ctx: &mut EvaluationContext,
        catalog: &Catalog,
    ) -> Result<bool, EvaluationError>;
}

/// Static or dynamic value lookup. The coercion layer lives outside this
/// crate; the catalog only stores and validates these entities.
pub trait Variable: CatalogEntity + fmt::Debug + Send + Sync {
    fn resolve(
        &self,
        ctx: &mut EvaluationContext,
        catalog: &Catalog,
    ) -> Result<Value, EvaluationError>;
}

/// Pluggable key lookup backing dynamic variables.
pub trait Resolver: CatalogEntity + fmt::Debug + Send + Sync {
    fn lookup(
        &self,
        key: &str,
        ctx: &mut EvaluationContext,
    ) -> Result<Option<Value>, EvaluationError>;
}

/// A field that holds either a reference into the catalog or a fully
/// inline value of the target type. Resolved exactly once before use.
pub enum RefOr<T: ?Sized> {
    Ref(EntityRef),
    Value(Arc<T>),
}

impl<T: ?Sized> RefOr<T> {
    pub fn reference(r: EntityRef) -> Self {
        RefOr::Ref(r)
    }

    pub fn value(v: Arc<T>) -> Self {
        RefOr::Value(v)
    }

    pub fn as_ref_descriptor(&self) -> Option<&EntityRef> {
        match self {
            RefOr::Ref(r) => Some(r),
            RefOr::Value(_) => None,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, RefOr::Value(_))
    }
}

impl<T: ?Sized> Clone for RefOr<T> {
    fn clone(&self) -> Self {
        match self {
            RefOr::Ref(r) => RefOr::Ref(r.clone()),
            RefOr::Value(v) => RefOr::Value(Arc::clone(v)),
        }
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for RefOr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefOr::Ref(r) => f.debug_tuple("Ref").field(r).finish(),
            RefOr::Value(v) => f.debug_tuple("Value").field(v).finish(),
        }
    }
}
