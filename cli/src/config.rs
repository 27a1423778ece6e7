//! CLI Configuration

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Keys accepted by `config set` and `config get`
pub const KEYS: &[&str] = &["api_url", "roll_number", "name", "default_format", "log_level"];

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub api_url: Option<String>,
    pub roll_number: Option<String>,
    pub name: Option<String>,
    pub default_format: Option<String>,
    pub log_level: Option<String>,
}

impl Config {
    pub fn load(profile: Option<&str>) -> Result<Self> {
        Self::load_from(&Self::config_path(profile)?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn save(&self, profile: Option<&str>) -> Result<PathBuf> {
        let path = Self::config_path(profile)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("writing {}", path.display()))
    }

    pub fn get(&self, key: &str) -> Result<Option<&str>> {
        let value = match key {
            "api_url" => &self.api_url,
            "roll_number" => &self.roll_number,
            "name" => &self.name,
            "default_format" => &self.default_format,
            "log_level" => &self.log_level,
            _ => bail!("Unknown config key: {} (expected one of {})", key, KEYS.join(", ")),
        };
        Ok(value.as_deref())
    }

    pub fn set(&mut self, key: &str, value: String) -> Result<()> {
        let slot = match key {
            "api_url" => &mut self.api_url,
            "roll_number" => &mut self.roll_number,
            "name" => &mut self.name,
            "default_format" => &mut self.default_format,
            "log_level" => &mut self.log_level,
            _ => bail!("Unknown config key: {} (expected one of {})", key, KEYS.join(", ")),
        };
        *slot = Some(value);
        Ok(())
    }

    pub fn config_path(profile: Option<&str>) -> Result<PathBuf> {
        let home = dirs::home_dir().context("Cannot find home directory")?;
        let filename = match profile {
            Some(p) => format!("config.{}.toml", p),
            None => "config.toml".to_string(),
        };
        Ok(home.join(".dynform").join(filename))
    }
}
