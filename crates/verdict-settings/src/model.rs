use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `verdict.toml` schema v1.
///
/// This is a *user-facing* config model: it is intentionally permissive
/// so forward-compat is easy. Enumerated fields stay strings here and are
/// validated during resolution.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VerdictConfigV1 {
    /// Optional schema string for tooling (`verdict.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Preset profile: `lenient` (default) or `strict`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Whether decisions are cached within a request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_cache: Option<bool>,

    /// Null constraint outcomes count as not-applicable instead of
    /// indeterminate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lenient_constraints: Option<bool>,

    /// Action failures are swallowed instead of failing the phase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_errors: Option<bool>,

    /// Default action strategy: `runAll`, `untilSuccess`, `stopOnFailure`,
    /// or `rollbackOnFailure`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_strategy: Option<String>,
}
