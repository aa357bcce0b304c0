//! # Configuration Management Module
//!
//! Pokeroller reads a single TOML file describing where progress is stored,
//! which catalog to load and how to log.
//!
//! ## Configuration Structure
//!
//! - [`GameConfig`] - Display name of the game instance
//! - [`StorageConfig`] - Data directory and optional sled database path
//! - [`CatalogConfig`] - Catalog and achievement definition files
//! - [`LoggingConfig`] - Log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pokeroller::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Config::create_default("config.toml").await?;
//!     let config = Config::load("config.toml").await?;
//!     println!("Game: {}", config.game.name);
//!     let rules = config.load_rules()?;
//!     println!("{} catalog entries", rules.catalog.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [game]
//! name = "Pokeroller"
//!
//! [storage]
//! data_dir = "./data"
//!
//! [catalog]
//! path = "./data/catalog.json"
//! synthesize_shinies = true
//!
//! [logging]
//! level = "info"
//! file = "pokeroller.log"
//! ```

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::gacha::{AchievementBook, Catalog, GameRules};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub game: GameConfig,
    pub storage: StorageConfig,
    pub catalog: CatalogConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Sled database directory. Defaults to `<data_dir>/pokeroller`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
}

impl StorageConfig {
    pub fn db_path(&self) -> PathBuf {
        match &self.db_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.data_dir).join("pokeroller"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub path: String,
    /// Add one shiny variant per base entry that lacks one.
    #[serde(default = "default_synthesize_shinies")]
    pub synthesize_shinies: bool,
    /// Custom achievement definitions (JSON). The starter set is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achievements_path: Option<String>,
}

fn default_synthesize_shinies() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Config {
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Load the catalog and achievement book this config points at.
    pub fn load_rules(&self) -> Result<GameRules> {
        let mut catalog = Catalog::load_json(&self.catalog.path)
            .map_err(|e| anyhow!("Failed to load catalog {}: {}", self.catalog.path, e))?;
        if self.catalog.synthesize_shinies {
            catalog = catalog
                .with_shiny_variants()
                .map_err(|e| anyhow!("Failed to add shiny variants: {}", e))?;
        }
        let achievements = match &self.catalog.achievements_path {
            Some(path) => AchievementBook::load_json(path)
                .map_err(|e| anyhow!("Failed to load achievements {}: {}", path, e))?,
            None => AchievementBook::starter(),
        };
        Ok(GameRules::new(catalog, achievements))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            game: GameConfig {
                name: "Pokeroller".to_string(),
            },
            storage: StorageConfig {
                data_dir: "./data".to_string(),
                db_path: None,
            },
            catalog: CatalogConfig {
                path: "./data/catalog.json".to_string(),
                synthesize_shinies: true,
                achievements_path: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("pokeroller.log".to_string()),
            },
        }
    }
}
