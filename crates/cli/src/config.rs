use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use buildcast_core::{Credential, PhaseCatalog};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const CONFIG_DIR_ENV: &str = "BUILDCAST_CONFIG_DIR";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const APP_DIR: &str = "buildcast";
const CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_STAGES: u32 = 4;
pub const MAX_STAGES: u32 = 10;

/// Settings stored in `config.toml`. Every field has a default, so a partial
/// file loads fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Saved API key; only used when neither the flag nor the env var is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    pub api_base_url: String,
    pub output_dir: PathBuf,
    pub default_stages: u32,
    /// TOML file with `phases = [...]` replacing the built-in catalog
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phases_file: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: imagen::DEFAULT_MODEL.to_string(),
            api_base_url: imagen::DEFAULT_BASE_URL.to_string(),
            output_dir: PathBuf::from("buildcast-output"),
            default_stages: DEFAULT_STAGES,
            phases_file: None,
        }
    }
}

impl CliConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        debug!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_STAGES).contains(&self.default_stages) {
            anyhow::bail!(
                "default_stages must be between 1 and {}, got {}",
                MAX_STAGES,
                self.default_stages
            );
        }
        Ok(())
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        // the file may hold an API key
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
        }

        debug!(path = %path.display(), "Config saved");
        Ok(())
    }

    pub fn phase_catalog(&self) -> Result<PhaseCatalog> {
        match &self.phases_file {
            Some(path) => PhaseCatalog::from_file(path)
                .with_context(|| format!("Failed to load phase catalog from {}", path.display())),
            None => Ok(PhaseCatalog::default()),
        }
    }
}

/// Directory holding `config.toml`.
pub fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

/// Pick the credential: command-line flag, then environment, then config file.
///
/// Blank values are skipped so an empty env var doesn't hide a saved key.
pub fn resolve_credential(
    flag: Option<String>,
    env: Option<String>,
    config: &CliConfig,
) -> Option<Credential> {
    [flag, env, config.api_key.clone()]
        .into_iter()
        .flatten()
        .map(Credential::new)
        .find(|c| !c.is_blank())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = CliConfig::default();
        assert!(config.api_key.is_none());
        assert_eq!(config.model, "imagen-4.0-generate-001");
        assert_eq!(config.default_stages, 4);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = CliConfig::load(&dir.path().join("config.toml")).await.unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = CliConfig {
            api_key: Some("saved-key".to_string()),
            default_stages: 6,
            ..Default::default()
        };
        config.save(&path).await.unwrap();

        let loaded = CliConfig::load(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "default_stages = 8\n").await.unwrap();

        let loaded = CliConfig::load(&path).await.unwrap();
        assert_eq!(loaded.default_stages, 8);
        assert_eq!(loaded.model, imagen::DEFAULT_MODEL);
        assert!(loaded.api_key.is_none());
    }

    #[tokio::test]
    async fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "default_stages = \"many\"\n").await.unwrap();

        assert!(CliConfig::load(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_out_of_range_default_stages_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        for bad in ["default_stages = 0\n", "default_stages = 500\n"] {
            tokio::fs::write(&path, bad).await.unwrap();
            let err = CliConfig::load(&path).await.unwrap_err();
            assert!(format!("{:#}", err).contains("default_stages must be between 1 and 10"));
        }

        tokio::fs::write(&path, "default_stages = 10\n").await.unwrap();
        assert_eq!(CliConfig::load(&path).await.unwrap().default_stages, 10);
    }

    #[tokio::test]
    async fn test_save_rejects_out_of_range_default_stages() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let config = CliConfig {
            default_stages: 0,
            ..Default::default()
        };

        assert!(config.save(&path).await.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_phase_catalog_from_file() {
        let dir = TempDir::new().unwrap();
        let phases = dir.path().join("phases.toml");
        std::fs::write(&phases, "phases = [\"ground\", \"walls\", \"roof\"]\n").unwrap();

        let config = CliConfig {
            phases_file: Some(phases),
            ..Default::default()
        };
        assert_eq!(config.phase_catalog().unwrap().len(), 3);

        let missing = CliConfig {
            phases_file: Some(dir.path().join("nope.toml")),
            ..Default::default()
        };
        assert!(missing.phase_catalog().is_err());

        assert_eq!(CliConfig::default().phase_catalog().unwrap().len(), 10);
    }

    #[test]
    fn test_resolve_credential_precedence() {
        let config = CliConfig {
            api_key: Some("from-config".to_string()),
            ..Default::default()
        };

        let key = resolve_credential(Some("from-flag".into()), Some("from-env".into()), &config);
        assert_eq!(key.unwrap().expose(), "from-flag");

        let key = resolve_credential(None, Some("from-env".into()), &config);
        assert_eq!(key.unwrap().expose(), "from-env");

        let key = resolve_credential(None, Some("".into()), &config);
        assert_eq!(key.unwrap().expose(), "from-config");

        assert!(resolve_credential(None, None, &CliConfig::default()).is_none());
    }
}
