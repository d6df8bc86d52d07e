use crate::identity::EntityKind;
use crate::result::PolicyResult;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One append-only audit record.
///
/// Events are best-effort: recording one can never fail or alter the
/// evaluation outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvalEvent {
    /// Identifier of the evaluation context that produced this event.
    pub context_id: String,
    pub kind: EntityKind,
    /// Slash-joined path of the node within the current traversal.
    pub path: String,
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<PolicyResult>,

    #[serde(default)]
    pub from_cache: bool,

    /// Failure reason (error display text), present on failed events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
}
