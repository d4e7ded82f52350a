use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com";
pub const DEFAULT_API_KEY: &str = "${OPENAI_API_KEY}";
pub const DEFAULT_MODEL: &str = "davinci-codex";
pub const DEFAULT_STORE_PATH: &str = "chat_sessions.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] config::ConfigError),
    #[error("{0} environment variable is not set.")]
    MissingApiKey(String),
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub store: StoreConfig,
}

/// Everything the chat loop needs, fixed once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub session_id: String,
    pub store_path: PathBuf,
}

impl AppConfig {
    pub fn load(path: &str) -> Result<Self, SettingsError> {
        dotenv::dotenv().ok();

        let settings = config::Config::builder()
            .set_default("llm.api_base", DEFAULT_API_BASE)?
            .set_default("llm.api_key", DEFAULT_API_KEY)?
            .set_default("llm.model", DEFAULT_MODEL)?
            .set_default("store.path", DEFAULT_STORE_PATH)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("CHATLINE").separator("__"))
            .build()?;

        let mut app_config: AppConfig = settings.try_deserialize()?;

        // Expand environment variables if present like ${HOME}
        app_config.llm.api_base = expand_env(&app_config.llm.api_base);
        app_config.store.path = expand_env(&app_config.store.path);

        Ok(app_config)
    }

    /// Combines the loaded configuration with command-line choices.
    ///
    /// Fails with [`SettingsError::MissingApiKey`] when the bearer token
    /// cannot be found, so callers can bail out before touching stdin.
    pub fn into_settings(
        self,
        model_override: Option<&str>,
        session_id: &str,
    ) -> Result<Settings, SettingsError> {
        let api_key = resolve_api_key(&self.llm.api_key)?;

        Ok(Settings {
            api_base: self.llm.api_base,
            api_key,
            model: model_override
                .map(str::to_string)
                .unwrap_or(self.llm.model),
            session_id: session_id.to_string(),
            store_path: PathBuf::from(self.store.path),
        })
    }
}

fn env_reference(val: &str) -> Option<&str> {
    val.strip_prefix("${")?.strip_suffix('}')
}

fn expand_env(val: &str) -> String {
    match env_reference(val) {
        Some(var_name) => std::env::var(var_name).unwrap_or_default(),
        None => val.to_string(),
    }
}

fn resolve_api_key(raw: &str) -> Result<String, SettingsError> {
    let (var_name, value) = match env_reference(raw) {
        Some(var_name) => (var_name, std::env::var(var_name).ok()),
        None => ("OPENAI_API_KEY", Some(raw.to_string())),
    };

    match value {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(SettingsError::MissingApiKey(var_name.to_string())),
    }
}
