use std::fs;
use std::path::Path;

use serde::Deserialize;
use voxgrid_io::EngineConfig;
use voxgrid_world::{ConfigError, WorldConfig};

/// Whole config file: a `[world]` table and an `[engine]` table, both optional.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = toml::from_str(s)?;
        cfg.world.validate()?;
        Ok(cfg)
    }
}

pub fn load_config_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
    let s = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    AppConfig::from_toml_str(&s)
}
