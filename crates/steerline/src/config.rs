use std::env;
use std::error::Error;
use std::fmt::{self, Debug, Display};

use steerline_openai_model::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAIConfig, OpenAIConfigBuilder,
};

/// The variable holding the API key. Required.
pub const API_KEY_VAR: &str = "DEEPSEEK_API_KEY";
/// The variable overriding the endpoint.
pub const BASE_URL_VAR: &str = "DEEPSEEK_BASE_URL";
/// The variable overriding the default model.
pub const MODEL_VAR: &str = "DEEPSEEK_MODEL";

/// The error type for loading a [`Config`].
#[derive(Debug)]
pub enum ConfigError {
    /// A required variable is not set, or is blank.
    Missing(&'static str),
    /// The `.env` file exists but couldn't be loaded.
    DotEnv(dotenvy::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(name) => {
                write!(f, "{name} environment variable is not set")
            }
            ConfigError::DotEnv(err) => write!(f, "failed to load .env: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Missing(_) => None,
            ConfigError::DotEnv(err) => Some(err),
        }
    }
}

/// Settings for talking to the model provider.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    api_key: String,
    base_url: String,
    model: String,
}

impl Config {
    /// Loads the configuration from the process environment, after
    /// loading `./.env` if it exists. Variables already set in the
    /// environment win over the file.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("loaded {}", path.display()),
            Err(err) if err.not_found() => trace!("no .env file"),
            Err(err) => return Err(ConfigError::DotEnv(err)),
        }
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let Some(api_key) = var(API_KEY_VAR) else {
            return Err(ConfigError::Missing(API_KEY_VAR));
        };
        Ok(Self {
            api_key,
            base_url: var(BASE_URL_VAR)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            model: var(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
        })
    }

    /// Returns the endpoint.
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the default model.
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Creates the provider configuration.
    pub fn provider_config(&self) -> OpenAIConfig {
        OpenAIConfigBuilder::with_api_key(&self.api_key)
            .with_base_url(&self.base_url)
            .with_model(&self.model)
            .build()
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup<'a>(
        vars: &'a HashMap<&str, &str>,
    ) -> impl Fn(&str) -> Option<String> + 'a {
        |name| vars.get(name).map(|v| (*v).to_owned())
    }

    #[test]
    fn test_defaults() {
        let vars = HashMap::from([(API_KEY_VAR, "sk-test")]);
        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.base_url(), "https://api.deepseek.com");
        assert_eq!(config.model(), "deepseek-chat");
        assert!(!format!("{config:?}").contains("sk-test"));
        assert_eq!(config.provider_config().model(), "deepseek-chat");
    }

    #[test]
    fn test_overrides() {
        let vars = HashMap::from([
            (API_KEY_VAR, "sk-test"),
            (BASE_URL_VAR, "http://localhost:8080"),
            (MODEL_VAR, "deepseek-reasoner"),
        ]);
        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.base_url(), "http://localhost:8080");
        assert_eq!(config.model(), "deepseek-reasoner");
    }

    #[test]
    fn test_missing_key() {
        for vars in [HashMap::new(), HashMap::from([(API_KEY_VAR, "  ")])] {
            let err = Config::from_lookup(lookup(&vars)).unwrap_err();
            assert!(matches!(err, ConfigError::Missing(API_KEY_VAR)));
            assert_eq!(
                err.to_string(),
                "DEEPSEEK_API_KEY environment variable is not set"
            );
        }
    }
}
