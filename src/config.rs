use crate::error::{ProtokolError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Fixed CC address of the supplier (every protocol e-mail carries it).
pub const SUPPLIER_EMAIL: &str = "info@deratem.cz";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub email_service_id: Option<String>,
    pub email_template_id: Option<String>,
    pub email_public_key: Option<String>,
    pub email_cc: String,
    pub technician_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            email_service_id: None,
            email_template_id: None,
            email_public_key: None,
            email_cc: SUPPLIER_EMAIL.into(),
            technician_name: "Tomáš Šmídek".into(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Directory shared by the config file and the protocol counter.
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ProtokolError::Config("domovský adresář nebyl nalezen".into()))?;
        Ok(home.join(".config").join("protokol"))
    }

    /// True when all three e-mail composer keys are set. Without them the
    /// dispatch falls back to a mailto: link (attachments are lost).
    pub fn has_composer(&self) -> bool {
        [
            &self.email_service_id,
            &self.email_template_id,
            &self.email_public_key,
        ]
        .iter()
        .all(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_composer() {
        let config = Config::default();
        assert!(!config.has_composer());
        assert_eq!(config.email_cc, SUPPLIER_EMAIL);
    }

    #[test]
    fn test_composer_requires_all_keys() {
        let mut config = Config::default();
        config.email_service_id = Some("service_x1".into());
        config.email_template_id = Some("template_y2".into());
        assert!(!config.has_composer());

        config.email_public_key = Some("key_z3".into());
        assert!(config.has_composer());

        config.email_template_id = Some("   ".into());
        assert!(!config.has_composer());
    }
}
