pub mod classify_cmd;
pub mod serve_cmd;

use std::path::Path;

use anyhow::Context;
use triage_core::TriageConfig;

pub use classify_cmd::ClassifyArgs;
pub use serve_cmd::ServeArgs;

/// Load the configuration from `path` when given, otherwise from the
/// default location. Environment overrides apply either way.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<TriageConfig> {
    match path {
        Some(path) => {
            let mut cfg = TriageConfig::load_from_path(path)
                .with_context(|| format!("loading config from {}", path.display()))?;
            cfg.apply_env_overrides(|key| std::env::var(key).ok());
            Ok(cfg)
        }
        None => Ok(TriageConfig::load()?),
    }
}
