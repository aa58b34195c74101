//! Configuration Store
//!
//! Loading, saving and resolving `tidyagent.toml`.

use super::{find_config_file, get_config_dir};
use crate::clean::CleaningOptions;
use crate::data::CsvOptions;
use crate::error::{CleanError, Result};
use crate::llm::{LlmConfig, LlmProvider, RetryConfig};
use crate::validate::Expectation;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "tidyagent.toml";

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Providers that run locally and take no API key
const KEYLESS_PROVIDERS: &[&str] = &["ollama", "lmstudio", "local"];

/// Unified configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmSection,
    pub agent: AgentSection,
    pub retry: RetryConfig,
    pub cleaning: CleaningOptions,
    pub csv: CsvOptions,
    pub logging: LoggingSection,
    /// Checks run by `tidyagent validate`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub expectations: Vec<Expectation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub provider: String,
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.0,
            max_tokens: 2048,
            timeout_secs: 120,
            system_prompt: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    /// Rows per prompt
    pub batch_size: usize,
    /// Batches in flight at once
    pub max_concurrency: usize,
    pub recursion_limit: usize,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            batch_size: crate::agent::DEFAULT_BATCH_SIZE,
            max_concurrency: 1,
            recursion_limit: crate::agent::DEFAULT_RECURSION_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    /// Log file; defaults to the data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CleanError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml()?;
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from the standard locations, or fall back to defaults
    pub fn load_or_default() -> Self {
        if let Some(path) = find_config_file() {
            match Self::load(&path) {
                Ok(config) => return config,
                Err(e) => log::warn!("Ignoring unreadable config {}: {}", path.display(), e),
            }
        }
        Self::default()
    }

    /// Load the given file (or the discovered one), apply environment
    /// overrides and validate the result
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::load_or_default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Get default config file path
    pub fn default_path() -> Option<PathBuf> {
        get_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
    }

    /// Apply `TIDYAGENT_*` environment variables
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    pub(crate) fn apply_overrides_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<()> {
        if let Some(model) = lookup("TIDYAGENT_MODEL") {
            self.llm.model = model;
        }
        if let Some(url) = lookup("TIDYAGENT_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(val) = lookup("TIDYAGENT_BATCH_SIZE") {
            self.agent.batch_size = val.trim().parse().map_err(|_| {
                CleanError::invalid_config(format!("TIDYAGENT_BATCH_SIZE is not a number: {}", val))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.agent.batch_size == 0 {
            return Err(CleanError::invalid_config("agent.batch_size must be greater than zero"));
        }
        if self.agent.max_concurrency == 0 {
            return Err(CleanError::invalid_config(
                "agent.max_concurrency must be greater than zero",
            ));
        }
        if !self.csv.delimiter.is_ascii() {
            return Err(CleanError::invalid_config(format!(
                "csv.delimiter must be a single ASCII character, got {:?}",
                self.csv.delimiter
            )));
        }
        self.provider()?;
        self.log_level()?;
        Ok(())
    }

    pub fn provider(&self) -> Result<LlmProvider> {
        self.llm
            .provider
            .parse()
            .map_err(|e: String| CleanError::invalid_config(e))
    }

    pub fn log_level(&self) -> Result<LevelFilter> {
        self.logging.level.parse().map_err(|_| {
            CleanError::invalid_config(format!("unknown log level '{}'", self.logging.level))
        })
    }

    /// Build the client configuration, reading the API key from the
    /// environment after loading `.env`
    pub fn llm_config(&self) -> Result<LlmConfig> {
        if let Ok(path) = dotenv::dotenv() {
            log::debug!("Loaded environment from {}", path.display());
        }
        self.llm_config_from(|key| std::env::var(key).ok())
    }

    pub(crate) fn llm_config_from(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<LlmConfig> {
        let provider = self.provider()?;
        let api_key = lookup(&self.llm.api_key_env).filter(|k| !k.trim().is_empty());

        let keyless = KEYLESS_PROVIDERS.contains(&self.llm.provider.to_lowercase().as_str());
        if api_key.is_none() && !keyless {
            return Err(CleanError::MissingConfig {
                key: self.llm.api_key_env.clone(),
            });
        }

        let base_url = if provider == LlmProvider::GoogleGenerativeAi
            && self.llm.base_url == OPENAI_BASE_URL
        {
            GEMINI_BASE_URL.to_string()
        } else {
            self.llm.base_url.clone()
        };

        let mut config = LlmConfig::new(provider, base_url, self.llm.model.clone(), api_key)
            .with_max_tokens(self.llm.max_tokens)
            .with_temperature(self.llm.temperature)
            .with_timeout(Duration::from_secs(self.llm.timeout_secs));
        if let Some(prompt) = &self.llm.system_prompt {
            config = config.with_system_prompt(prompt.clone());
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::{ImputeStrategy, TextCase};
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.agent.batch_size, 20);
        assert_eq!(config.agent.recursion_limit, 25);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.csv.delimiter, ',');
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = Config::default();
        config.llm.model = "llama3".to_string();
        config.cleaning.impute = ImputeStrategy::Median;
        config.save(&config_path).unwrap();

        let loaded = Config::load(&config_path).unwrap();
        assert_eq!(loaded.llm.model, "llama3");
        assert_eq!(loaded.cleaning.impute, ImputeStrategy::Median);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/definitely/not/here/tidyagent.toml").unwrap_err();
        assert!(matches!(err, CleanError::FileNotFound { .. }));
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [llm]
            provider = "ollama"
            base_url = "http://localhost:11434/v1"

            [agent]
            batch_size = 50

            [cleaning]
            impute = "const:unknown"
            text_case = "title"
            deduplicate = false

            [cleaning.column_strategies]
            age = "median"

            [csv]
            delimiter = ";"

            [[expectations]]
            type = "column_values_not_null"
            column = "id"
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.agent.batch_size, 50);
        assert_eq!(config.agent.max_concurrency, 1);
        assert_eq!(
            config.cleaning.impute,
            ImputeStrategy::Constant("unknown".to_string())
        );
        assert_eq!(config.cleaning.text.case, TextCase::Title);
        assert!(config.cleaning.text.trim);
        assert!(!config.cleaning.deduplicate);
        assert_eq!(
            config.cleaning.column_strategies.get("age"),
            Some(&ImputeStrategy::Median)
        );
        assert_eq!(config.csv.delimiter, ';');
        assert_eq!(config.expectations.len(), 1);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides_from(env(&[
                ("TIDYAGENT_MODEL", "gpt-4o"),
                ("TIDYAGENT_BATCH_SIZE", " 5 "),
            ]))
            .unwrap();
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.agent.batch_size, 5);
        assert_eq!(config.llm.base_url, OPENAI_BASE_URL);

        let err = config
            .apply_overrides_from(env(&[("TIDYAGENT_BATCH_SIZE", "lots")]))
            .unwrap_err();
        assert!(matches!(err, CleanError::InvalidConfig { .. }));
    }

    #[test]
    fn test_validation_errors() {
        let mut config = Config::default();
        config.agent.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.csv.delimiter = '§';
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.llm.provider = "telegraph".to_string();
        assert!(matches!(
            config.validate(),
            Err(CleanError::InvalidConfig { .. })
        ));

        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_llm_config_requires_key() {
        let config = Config::default();
        match config.llm_config_from(env(&[])) {
            Err(CleanError::MissingConfig { key }) => assert_eq!(key, "OPENAI_API_KEY"),
            other => panic!("unexpected result: {other:?}"),
        }

        let llm = config
            .llm_config_from(env(&[("OPENAI_API_KEY", "sk-abc")]))
            .unwrap();
        assert_eq!(llm.api_key.as_deref(), Some("sk-abc"));
        assert_eq!(llm.temperature, Some(0.0));
        assert_eq!(llm.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_llm_config_provider_specifics() {
        let mut config = Config::default();
        config.llm.provider = "ollama".to_string();
        let llm = config.llm_config_from(env(&[])).unwrap();
        assert_eq!(llm.provider, LlmProvider::OpenAiCompatible);
        assert!(llm.api_key.is_none());

        config.llm.provider = "gemini".to_string();
        config.llm.api_key_env = "GEMINI_API_KEY".to_string();
        let llm = config
            .llm_config_from(env(&[("GEMINI_API_KEY", "g")]))
            .unwrap();
        assert_eq!(llm.provider, LlmProvider::GoogleGenerativeAi);
        assert_eq!(llm.base_url, GEMINI_BASE_URL);
    }
}
