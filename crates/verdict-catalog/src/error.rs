use verdict_types::EntityRef;

/// Fatal construction-time failures. A catalog is never returned in a
/// partially valid state.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("cannot register {0} entity: id must not be blank")]
    BlankId(verdict_types::EntityKind),

    #[error("missing references: {}", .0.join(", "))]
    MissingReferences(Vec<String>),

    #[error("circular references: {}", .0.join(" -> "))]
    CircularReferences(Vec<String>),

    #[error("label search requires at least one label")]
    EmptyLabelQuery,
}

/// Evaluation-time failures raised by conditions, actions, variables, or
/// unresolved references against a live catalog.
///
/// These never escape the engine: they are caught at the node or action
/// phase boundary, downgraded to an indeterminate result or `false`, and
/// recorded as failed events with this error's display text as the reason.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("unresolved reference: {0}")]
    MissingReference(EntityRef),

    #[error("condition error: {0}")]
    Condition(String),

    #[error("action error: {0}")]
    Action(String),

    #[error("variable error: {0}")]
    Variable(String),

    #[error("{0}")]
    Other(String),
}

impl EvaluationError {
    pub fn condition(message: impl Into<String>) -> Self {
        Self::Condition(message.into())
    }

    pub fn action(message: impl Into<String>) -> Self {
        Self::Action(message.into())
    }

    pub fn variable(message: impl Into<String>) -> Self {
        Self::Variable(message.into())
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}
