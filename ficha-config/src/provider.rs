//! Configuration provider using Figment

use crate::discovery::{ConfigFile, ConfigFormat, FileDiscovery};
use crate::error::ConfigResult;
use crate::types::FichaConfig;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use tracing::{debug, info};

/// Prefix for environment overrides
const ENV_PREFIX: &str = "FICHA_";

/// Loads [`FichaConfig`] from defaults, discovered files and the environment.
///
/// No caching is performed; every call reads the sources again.
#[derive(Debug, Default)]
pub struct ConfigProvider {
    discovery: FileDiscovery,
}

impl ConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific discovery (explicit directories)
    pub fn with_discovery(discovery: FileDiscovery) -> Self {
        Self { discovery }
    }

    /// Load and validate the configuration
    pub fn load(&self) -> ConfigResult<FichaConfig> {
        let config: FichaConfig = self.build_figment().extract()?;
        config.validate()?;
        info!(
            max_level = config.comments.max_level,
            bucket = %config.storage.bucket,
            "Loaded ficha configuration"
        );
        Ok(config)
    }

    /// Build the figment with all sources in precedence order
    pub fn build_figment(&self) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(FichaConfig::default()));

        for file in self.discovery.discover_all() {
            debug!("Merging config file {}", file.path.display());
            figment = figment.merge(Self::file_provider(&file));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn file_provider(file: &ConfigFile) -> Figment {
        match file.format {
            ConfigFormat::Toml => Figment::from(Toml::file(&file.path)),
            ConfigFormat::Yaml => Figment::from(Yaml::file(&file.path)),
            ConfigFormat::Json => Figment::from(Json::file(&file.path)),
        }
    }
}
