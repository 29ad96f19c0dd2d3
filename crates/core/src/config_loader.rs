use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

/// Default location of the TOML config file.
pub const DEFAULT_CONFIG_PATH: &str = "config/Config.toml";

/// Prefix of environment overrides (`IBH_IB__PORT=4002`).
pub const ENV_PREFIX: &str = "IBH_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration by layering compiled defaults, the TOML file at
    /// `path` (skipped when absent) and `IBH_`-prefixed environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or an environment value cannot be parsed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), exists = path.exists(), "Loading configuration");

        let config: AppConfig = Self::figment(path)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::file(path))
    }

    /// Loads configuration from the file only, ignoring the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed.
    pub fn load_file_only(path: impl AsRef<Path>) -> Result<AppConfig> {
        let config: AppConfig = Self::figment(path.as_ref()).extract()?;
        Ok(config)
    }
}
