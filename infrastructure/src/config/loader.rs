//! Configuration file loader with multi-source merging

use super::file_config::EngineConfig;
use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use std::path::PathBuf;

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Explicit config path (if provided)
    /// 2. Project root: `./accord.toml` or `./.accord.toml`
    /// 3. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<EngineConfig, Box<figment::Error>> {
        let mut figment = Figment::new().merge(Serialized::defaults(EngineConfig::default()));

        // Add project-level config files (check both names)
        for filename in &["accord.toml", ".accord.toml"] {
            let path = PathBuf::from(filename);
            if path.exists() {
                figment = figment.merge(Toml::file(&path));
                break;
            }
        }

        // Add explicit config path (highest priority)
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.extract().map_err(Box::new)
    }

    /// Load only default configuration
    pub fn load_defaults() -> EngineConfig {
        EngineConfig::default()
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        for filename in &["accord.toml", ".accord.toml"] {
            let path = PathBuf::from(filename);
            if path.exists() {
                return Some(path);
            }
        }
        None
    }
}
