use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The outcome of evaluating a policy node.
///
/// There is deliberately no numeric ordering between variants; each
/// combination logic spells out its own precedence rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum PolicyResult {
    Permit,
    Deny,
    NotApplicable,
    IndeterminatePermit,
    IndeterminateDeny,
    IndeterminateDenyPermit,
}

impl PolicyResult {
    /// An applicable result is a definitive PERMIT or DENY.
    pub fn is_applicable(self) -> bool {
        matches!(self, PolicyResult::Permit | PolicyResult::Deny)
    }

    pub fn is_indeterminate(self) -> bool {
        matches!(
            self,
            PolicyResult::IndeterminatePermit
                | PolicyResult::IndeterminateDeny
                | PolicyResult::IndeterminateDenyPermit
        )
    }
}

/// The target effect of an atomic policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Effect {
    Permit,
    Deny,
}

impl Effect {
    pub fn negated(self) -> Effect {
        match self {
            Effect::Permit => Effect::Deny,
            Effect::Deny => Effect::Permit,
        }
    }

    /// The result produced when the effect applies.
    pub fn result(self) -> PolicyResult {
        match self {
            Effect::Permit => PolicyResult::Permit,
            Effect::Deny => PolicyResult::Deny,
        }
    }

    /// The indeterminate counterpart of this effect.
    pub fn indeterminate(self) -> PolicyResult {
        match self {
            Effect::Permit => PolicyResult::IndeterminatePermit,
            Effect::Deny => PolicyResult::IndeterminateDeny,
        }
    }
}

impl From<Effect> for PolicyResult {
    fn from(effect: Effect) -> Self {
        effect.result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_tokens_are_stable() {
        // Interop contract: these exact tokens must never change.
        let pairs = [
            (PolicyResult::Permit, "\"permit\""),
            (PolicyResult::Deny, "\"deny\""),
            (PolicyResult::NotApplicable, "\"notApplicable\""),
            (PolicyResult::IndeterminatePermit, "\"indeterminatePermit\""),
            (PolicyResult::IndeterminateDeny, "\"indeterminateDeny\""),
            (
                PolicyResult::IndeterminateDenyPermit,
                "\"indeterminateDenyPermit\"",
            ),
        ];
        for (value, token) in pairs {
            assert_eq!(serde_json::to_string(&value).unwrap(), token);
            let back: PolicyResult = serde_json::from_str(token).unwrap();
            assert_eq!(back, value);
        }
    }

    #[test]
    fn applicability() {
        assert!(PolicyResult::Permit.is_applicable());
        assert!(PolicyResult::Deny.is_applicable());
        assert!(!PolicyResult::NotApplicable.is_applicable());
        assert!(!PolicyResult::IndeterminateDenyPermit.is_applicable());
        assert!(PolicyResult::IndeterminatePermit.is_indeterminate());
        assert!(!PolicyResult::Permit.is_indeterminate());
    }

    #[test]
    fn effect_conversions() {
        assert_eq!(Effect::Permit.negated(), Effect::Deny);
        assert_eq!(PolicyResult::from(Effect::Deny), PolicyResult::Deny);
        assert_eq!(
            Effect::Deny.indeterminate(),
            PolicyResult::IndeterminateDeny
        );
    }
}
