use crate::result::PolicyResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How a policy set merges child results into one result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum CombinationLogic {
    DenyOverrides,
    PermitOverrides,
    DenyUnlessPermit,
    PermitUnlessDeny,
    FirstApplicable,
    OnlyOneApplicable,
}

/// How a decision's attached action list is executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ActionExecutionStrategy {
    /// Run every eligible entry regardless of individual outcomes.
    #[default]
    RunAll,
    /// Stop at the first entry that reports success.
    UntilSuccess,
    /// Abort the phase at the first failure.
    StopOnFailure,
    /// Like `StopOnFailure`, but restore the data store on abort.
    RollbackOnFailure,
}

/// Per-entry eligibility filter for action relationships.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionMode {
    OnPermit,
    OnDeny,
    OnIndeterminate,
    OnNotApplicable,
}

impl ExecutionMode {
    /// Whether this mode matches a decision result.
    ///
    /// `OnIndeterminate` covers all three indeterminate variants.
    pub fn matches(self, result: PolicyResult) -> bool {
        match self {
            ExecutionMode::OnPermit => result == PolicyResult::Permit,
            ExecutionMode::OnDeny => result == PolicyResult::Deny,
            ExecutionMode::OnIndeterminate => result.is_indeterminate(),
            ExecutionMode::OnNotApplicable => result == PolicyResult::NotApplicable,
        }
    }
}
