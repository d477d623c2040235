use std::path::Path;

use anyhow::Context;
use strata_config::StrataConfig;

use crate::cli::GlobalFlags;

/// Load and validate configuration.
///
/// With `--config`, a `.env` next to that file is read before the regular
/// `.env` lookup, and the file replaces `.strata/config.toml`.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<StrataConfig> {
    let config = match &flags.config {
        Some(path) => {
            load_sibling_dotenv(path)?;
            StrataConfig::load_from(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?
        }
        None => StrataConfig::load_with_dotenv()?,
    };
    config.validate()?;
    Ok(config)
}

fn load_sibling_dotenv(config_path: &Path) -> anyhow::Result<()> {
    let Some(dir) = config_path.parent() else {
        return Ok(());
    };
    let env_path = dir.join(".env");
    if !env_path.exists() {
        return Ok(());
    }
    dotenvy::from_path(&env_path)
        .with_context(|| format!("failed to load {}", env_path.display()))?;
    tracing::debug!(path = %env_path.display(), "loaded .env next to config file");
    Ok(())
}
