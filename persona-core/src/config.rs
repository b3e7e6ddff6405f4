//! Process configuration.
//!
//! Built once at start-up from an optional TOML file plus environment
//! overrides, then passed by reference into every component. Nothing outside
//! this module reads the environment.

use crate::error::{ConfigError, CoreError};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

pub const ENV_REDDIT_CLIENT_ID: &str = "REDDIT_CLIENT_ID";
pub const ENV_REDDIT_CLIENT_SECRET: &str = "REDDIT_CLIENT_SECRET";
pub const ENV_REDDIT_USER_AGENT: &str = "REDDIT_USER_AGENT";
pub const ENV_GROQ_API_KEY: &str = "GROQ_API_KEY";
pub const ENV_GROQ_BASE_URL: &str = "GROQ_BASE_URL";
pub const ENV_PROMPT_CHAR_BUDGET: &str = "PROMPT_CHAR_BUDGET";

/// A credential value. Never printed by `Debug` or `Display`.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([redacted])")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[redacted]")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<Secret>,
    pub user_agent: String,
    pub api_base: String,
    pub token_url: String,
    pub timeout_secs: u64,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            user_agent: "persona-digest/0.1 (reddit persona analyzer)".to_string(),
            api_base: "https://oauth.reddit.com".to_string(),
            token_url: "https://www.reddit.com/api/v1/access_token".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<Secret>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.groq.com/openai/v1".to_string(),
            timeout_secs: 120,
            max_tokens: 4000,
            temperature: 0.3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Upper bound on embedded item text, in characters.
    pub char_budget: usize,
    /// Each item body is clipped to this many characters before budgeting.
    pub max_item_chars: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            char_budget: 24_000,
            max_item_chars: 500,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub reddit: RedditConfig,
    pub llm: LlmConfig,
    pub prompt: PromptConfig,
}

impl AppConfig {
    pub const DEFAULT_FILE: &'static str = "persona.toml";

    /// Load from `path` (or `persona.toml` when present), then apply the
    /// process environment on top.
    pub fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(Self::DEFAULT_FILE).exists() => {
                Self::from_file(Path::new(Self::DEFAULT_FILE))?
            }
            None => {
                debug!("No configuration file, using defaults");
                Self::default()
            }
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;

        info!(
            reddit_configured = config.reddit_configured(),
            llm_configured = config.llm_configured(),
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => ConfigError::Unreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            },
        })?;
        debug!("Read configuration from {}", path.display());
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Overlay values from `lookup`; empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(id) = get(ENV_REDDIT_CLIENT_ID) {
            self.reddit.client_id = Some(id);
        }
        if let Some(secret) = get(ENV_REDDIT_CLIENT_SECRET) {
            self.reddit.client_secret = Some(Secret::new(secret));
        }
        if let Some(agent) = get(ENV_REDDIT_USER_AGENT) {
            self.reddit.user_agent = agent;
        }
        if let Some(key) = get(ENV_GROQ_API_KEY) {
            self.llm.api_key = Some(Secret::new(key));
        }
        if let Some(url) = get(ENV_GROQ_BASE_URL) {
            self.llm.base_url = url;
        }
        if let Some(budget) = get(ENV_PROMPT_CHAR_BUDGET) {
            self.prompt.char_budget =
                budget
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        field: ENV_PROMPT_CHAR_BUDGET.to_string(),
                        value: budget.clone(),
                    })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prompt.char_budget == 0 {
            return Err(ConfigError::InvalidValue {
                field: "prompt.char_budget".to_string(),
                value: "0".to_string(),
            });
        }
        if self.prompt.max_item_chars == 0 {
            return Err(ConfigError::InvalidValue {
                field: "prompt.max_item_chars".to_string(),
                value: "0".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "llm.temperature".to_string(),
                value: self.llm.temperature.to_string(),
            });
        }
        Ok(())
    }

    pub fn reddit_credentials(&self) -> Result<(&str, &Secret), ConfigError> {
        let id = self
            .reddit
            .client_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
                var_name: ENV_REDDIT_CLIENT_ID.to_string(),
            })?;
        let secret = self
            .reddit
            .client_secret
            .as_ref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
                var_name: ENV_REDDIT_CLIENT_SECRET.to_string(),
            })?;
        Ok((id, secret))
    }

    pub fn llm_api_key(&self) -> Result<&Secret, ConfigError> {
        self.llm
            .api_key
            .as_ref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
                var_name: ENV_GROQ_API_KEY.to_string(),
            })
    }

    pub fn reddit_configured(&self) -> bool {
        self.reddit_credentials().is_ok()
    }

    pub fn llm_configured(&self) -> bool {
        self.llm_api_key().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.reddit.api_base, "https://oauth.reddit.com");
        assert_eq!(config.llm.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(config.prompt.max_item_chars, 500);
        assert!(!config.reddit_configured());
        assert!(!config.llm_configured());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_with_env_override() {
        let mut config = AppConfig::from_toml_str(
            r#"
            [reddit]
            client_id = "from-file"
            client_secret = "file-secret"

            [prompt]
            char_budget = 1000
            "#,
        )
        .unwrap();
        assert_eq!(config.reddit.client_id.as_deref(), Some("from-file"));
        assert_eq!(config.prompt.char_budget, 1000);
        assert_eq!(config.prompt.max_item_chars, 500);

        config
            .apply_env(lookup_from(&[
                (ENV_REDDIT_CLIENT_ID, "from-env"),
                (ENV_GROQ_API_KEY, "gsk_test"),
                (ENV_REDDIT_CLIENT_SECRET, ""),
            ]))
            .unwrap();

        let (id, secret) = config.reddit_credentials().unwrap();
        assert_eq!(id, "from-env");
        assert_eq!(secret.expose(), "file-secret");
        assert_eq!(config.llm_api_key().unwrap().expose(), "gsk_test");
    }

    #[test]
    fn test_missing_credentials() {
        let config = AppConfig::default();
        match config.reddit_credentials() {
            Err(ConfigError::MissingEnvironmentVariable { var_name }) => {
                assert_eq!(var_name, ENV_REDDIT_CLIENT_ID)
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(matches!(
            config.llm_api_key(),
            Err(ConfigError::MissingEnvironmentVariable { .. })
        ));
    }

    #[test]
    fn test_invalid_budget_from_env() {
        let mut config = AppConfig::default();
        let result = config.apply_env(lookup_from(&[(ENV_PROMPT_CHAR_BUDGET, "lots")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_secret_is_redacted() {
        let mut config = AppConfig::default();
        config
            .apply_env(lookup_from(&[(ENV_GROQ_API_KEY, "gsk_very_secret")]))
            .unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("gsk_very_secret"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[llm]\nmax_tokens = 1234\ntemperature = 0.5").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.llm.max_tokens, 1234);
        assert_eq!(config.llm.temperature, 0.5);

        let missing = AppConfig::from_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(missing, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_invalid_toml() {
        let result = AppConfig::from_toml_str("[reddit\nclient_id = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
