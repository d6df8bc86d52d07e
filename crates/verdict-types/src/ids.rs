//! Stable tokens used in audit paths.
//!
//! Anonymous nodes have no identity to name them, so their path segment
//! falls back to the variant token.

pub const SEGMENT_POLICY: &str = "policy";
pub const SEGMENT_POLICY_SET: &str = "policySet";
pub const SEGMENT_POLICY_DEFAULT: &str = "policyDefault";
pub const SEGMENT_ACTIONS: &str = "actions";
pub const SEGMENT_ACTION: &str = "action";
