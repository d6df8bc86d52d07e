//! Config parsing and profile/preset resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves
//! configuration provided as strings.

#![forbid(unsafe_code)]

mod model;
mod presets;
mod resolve;

pub use model::VerdictConfigV1;
pub use resolve::{Overrides, ResolvedOptions};

/// Parse `verdict.toml` (or equivalent) into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<VerdictConfigV1> {
    let cfg: VerdictConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the effective engine options (profile + overrides + explicit
/// fields).
pub fn resolve_config(
    cfg: VerdictConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedOptions> {
    resolve::resolve_config(cfg, overrides)
}
