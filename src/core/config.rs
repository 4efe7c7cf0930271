use crate::core::currency::CurrencyCode;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FrankfurterProviderConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for FrankfurterProviderConfig {
    fn default() -> Self {
        FrankfurterProviderConfig {
            base_url: crate::providers::frankfurter::DEFAULT_BASE_URL.to_string(),
            timeout_secs: default_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FirebaseProviderConfig {
    pub api_key: String,
    pub project_id: String,
    #[serde(default = "default_auth_base_url")]
    pub auth_base_url: String,
    #[serde(default = "default_firestore_base_url")]
    pub firestore_base_url: String,
    #[serde(default = "default_firebase_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub frankfurter: FrankfurterProviderConfig,
    pub firebase: Option<FirebaseProviderConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Base currency every rate is quoted in.
    #[serde(default = "default_currency")]
    pub currency: CurrencyCode,
    /// Currencies shown by `rates` unless `--all` is passed. Empty shows all.
    #[serde(default)]
    pub watchlist: Vec<CurrencyCode>,
    #[serde(default = "default_history_days")]
    pub history_days: u32,
    #[serde(default)]
    pub providers: ProvidersConfig,
    pub data_path: Option<String>,
}

fn default_currency() -> CurrencyCode {
    CurrencyCode::from_str_unchecked("TRY")
}

fn default_history_days() -> u32 {
    30
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_cache_ttl_secs() -> u64 {
    60
}

fn default_firebase_timeout_secs() -> u64 {
    10
}

fn default_auth_base_url() -> String {
    "https://identitytoolkit.googleapis.com".to_string()
}

fn default_firestore_base_url() -> String {
    "https://firestore.googleapis.com".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            currency: default_currency(),
            watchlist: Vec::new(),
            history_days: default_history_days(),
            providers: ProvidersConfig::default(),
            data_path: None,
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, falling back to defaults
    /// when no config file has been created yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("app", "nomisma", "nomisma")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("app", "nomisma", "nomisma")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn firebase(&self) -> Result<&FirebaseProviderConfig> {
        self.providers
            .firebase
            .as_ref()
            .context("Account features need `providers.firebase` in the config file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
currency: "eur"
watchlist: ["USD", "gbp", "CHF"]
history_days: 14
providers:
  frankfurter:
    base_url: "http://example.com/fx"
    timeout_secs: 2
  firebase:
    api_key: "test-key"
    project_id: "nomisma-test"
data_path: "/tmp/nomisma"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.currency.as_str(), "EUR");
        let watchlist: Vec<&str> = config.watchlist.iter().map(|c| c.as_str()).collect();
        assert_eq!(watchlist, vec!["USD", "GBP", "CHF"]);
        assert_eq!(config.history_days, 14);
        assert_eq!(config.providers.frankfurter.base_url, "http://example.com/fx");
        assert_eq!(config.providers.frankfurter.timeout_secs, 2);
        assert_eq!(config.providers.frankfurter.cache_ttl_secs, 60);

        let firebase = config.firebase().unwrap();
        assert_eq!(firebase.api_key, "test-key");
        assert_eq!(firebase.project_id, "nomisma-test");
        assert_eq!(firebase.auth_base_url, "https://identitytoolkit.googleapis.com");
        assert_eq!(firebase.firestore_base_url, "https://firestore.googleapis.com");
        assert_eq!(firebase.timeout_secs, 10);
        assert_eq!(
            config.default_data_path().unwrap(),
            PathBuf::from("/tmp/nomisma")
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.currency.as_str(), "TRY");
        assert!(config.watchlist.is_empty());
        assert_eq!(config.history_days, 30);
        assert_eq!(
            config.providers.frankfurter.base_url,
            "https://api.frankfurter.app"
        );
        assert_eq!(config.providers.frankfurter.timeout_secs, 5);
        assert!(config.firebase().is_err());
    }

    #[test]
    fn test_firebase_timeout_override() {
        let yaml_str = r#"
providers:
  firebase:
    api_key: "k"
    project_id: "p"
    timeout_secs: 3
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        assert_eq!(config.firebase().unwrap().timeout_secs, 3);
    }

    #[test]
    fn test_invalid_currency_is_rejected() {
        let result = serde_yaml::from_str::<AppConfig>("currency: \"LIRA\"");
        assert!(result.is_err());
    }
}
