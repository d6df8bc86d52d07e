use crate::{model::VerdictConfigV1, presets};
use anyhow::Context;
use verdict_catalog::NodeDefaults;
use verdict_types::ActionExecutionStrategy;

/// Caller-side overrides that win over anything in the config file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub profile: Option<String>,
    pub use_cache: Option<bool>,
}

/// Fully resolved engine options.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedOptions {
    pub profile: String,
    pub use_cache: bool,
    /// Construction defaults applied to nodes that do not set their own
    /// flags.
    pub defaults: NodeDefaults,
}

pub fn resolve_config(
    cfg: VerdictConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedOptions> {
    let profile = overrides
        .profile
        .clone()
        .or(cfg.profile.clone())
        .unwrap_or_else(|| "lenient".to_string());
    validate_profile(&profile)?;

    let mut resolved = presets::preset(&profile);

    if let Some(use_cache) = overrides.use_cache.or(cfg.use_cache) {
        resolved.use_cache = use_cache;
    }
    if let Some(lenient) = cfg.lenient_constraints {
        resolved.defaults.lenient_constraints = lenient;
    }
    if let Some(ignore) = cfg.ignore_errors {
        resolved.defaults.ignore_errors = ignore;
    }
    if let Some(strategy) = cfg.action_strategy.as_deref() {
        resolved.defaults.action_strategy =
            parse_strategy(strategy).context("invalid action_strategy")?;
    }

    Ok(resolved)
}

fn validate_profile(v: &str) -> anyhow::Result<()> {
    match v {
        "lenient" | "strict" => Ok(()),
        other => anyhow::bail!("unknown profile: {other} (expected 'lenient' or 'strict')"),
    }
}

fn parse_strategy(v: &str) -> anyhow::Result<ActionExecutionStrategy> {
    match v {
        "runAll" => Ok(ActionExecutionStrategy::RunAll),
        "untilSuccess" => Ok(ActionExecutionStrategy::UntilSuccess),
        "stopOnFailure" => Ok(ActionExecutionStrategy::StopOnFailure),
        "rollbackOnFailure" => Ok(ActionExecutionStrategy::RollbackOnFailure),
        other => anyhow::bail!(
            "unknown action strategy: {other} \
             (expected runAll|untilSuccess|stopOnFailure|rollbackOnFailure)"
        ),
    }
}
