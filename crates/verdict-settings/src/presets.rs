use crate::resolve::ResolvedOptions;
use verdict_catalog::NodeDefaults;
use verdict_types::ActionExecutionStrategy;

/// Preset profiles are opinionated defaults.
///
/// Keep these small and readable. Anything more specific belongs in the
/// config file or per-node flags.
pub fn preset(profile: &str) -> ResolvedOptions {
    match profile {
        "strict" => strict_profile(),
        // default
        _ => lenient_profile(),
    }
}

fn lenient_profile() -> ResolvedOptions {
    ResolvedOptions {
        profile: "lenient".to_string(),
        use_cache: true,
        defaults: NodeDefaults::default(),
    }
}

fn strict_profile() -> ResolvedOptions {
    // Strict mode surfaces every gap: null constraints and action
    // failures become visible instead of being swallowed, and action
    // phases stop at the first failure.
    ResolvedOptions {
        profile: "strict".to_string(),
        use_cache: true,
        defaults: NodeDefaults {
            lenient_constraints: false,
            ignore_errors: false,
            action_strategy: ActionExecutionStrategy::StopOnFailure,
        },
    }
}
