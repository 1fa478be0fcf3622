use crate::error::{to_env_var, ConfigError, ENV_PREFIX};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use stormcrow::agent::{UnknownToolPolicy, DEFAULT_MAX_TURNS};
use stormcrow::providers::{
    configs::{OllamaProviderConfig, OpenAiProviderConfig, ProviderConfig},
    ollama, openai,
};
use stormcrow::tools::weather::{WeatherConfig, WEATHER_HOST, WEATHER_TIMEOUT};

/// Fallback for the OpenAI key when it is not set in any config layer
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum ProviderSettings {
    OpenAi {
        #[serde(default = "default_openai_host")]
        host: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default = "default_openai_model")]
        model: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<i32>,
    },
    Ollama {
        #[serde(default = "default_ollama_host")]
        host: String,
        #[serde(default = "default_ollama_model")]
        model: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<i32>,
    },
}

impl ProviderSettings {
    pub fn model(&self) -> &str {
        match self {
            ProviderSettings::OpenAi { model, .. } => model,
            ProviderSettings::Ollama { model, .. } => model,
        }
    }

    // Convert to the stormcrow ProviderConfig, resolving the api key
    pub fn into_config(self) -> Result<ProviderConfig, ConfigError> {
        match self {
            ProviderSettings::OpenAi {
                host,
                api_key,
                model,
                temperature,
                max_tokens,
            } => {
                let api_key = api_key
                    .filter(|key| !key.is_empty())
                    .or_else(|| std::env::var(OPENAI_API_KEY).ok())
                    .filter(|key| !key.is_empty())
                    .ok_or_else(|| ConfigError::MissingEnvVar {
                        env_var: format!("{} or {}", OPENAI_API_KEY, to_env_var("provider.api_key")),
                    })?;

                Ok(ProviderConfig::OpenAi(OpenAiProviderConfig {
                    host,
                    api_key,
                    model,
                    temperature,
                    max_tokens,
                }))
            }
            ProviderSettings::Ollama {
                host,
                model,
                temperature,
                max_tokens,
            } => Ok(ProviderConfig::Ollama(OllamaProviderConfig {
                host,
                model,
                temperature,
                max_tokens,
            })),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    #[serde(default)]
    pub unknown_tool: UnknownToolPolicy,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            unknown_tool: UnknownToolPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherSettings {
    #[serde(default = "default_weather_host")]
    pub host: String,
    #[serde(default = "default_weather_timeout")]
    pub timeout_secs: u64,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            host: default_weather_host(),
            timeout_secs: default_weather_timeout(),
        }
    }
}

impl WeatherSettings {
    pub fn into_config(self) -> WeatherConfig {
        WeatherConfig {
            host: self.host,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Values given on the command line, applied over every other layer
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub host: Option<String>,
    pub api_key: Option<String>,
    pub max_turns: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub provider: ProviderSettings,
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub weather: WeatherSettings,
}

impl Settings {
    /// Load settings from the config file, the environment and the command line.
    ///
    /// An explicit `path` must exist; the default file under the user's config
    /// directory is optional.
    pub fn new(path: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => Some(File::from(path.to_path_buf()).required(true)),
            None => default_config_path().map(|path| File::from(path).required(false)),
        };
        Self::load_and_validate(file, overrides)
    }

    fn load_and_validate(
        file: Option<File<config::FileSourceFile, config::FileFormat>>,
        overrides: &Overrides,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // Provider defaults, the per-provider fields default through serde
            .set_default("provider.type", "openai")?
            .set_default("agent.max_turns", DEFAULT_MAX_TURNS as u64)?
            .set_default("weather.host", default_weather_host())?
            .set_default("weather.timeout_secs", default_weather_timeout())?;

        if let Some(file) = file {
            builder = builder.add_source(file);
        }

        let config = builder
            // Layer on the environment variables
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            // And the command line last
            .set_override_option("provider.type", overrides.provider.clone())?
            .set_override_option("provider.model", overrides.model.clone())?
            .set_override_option("provider.host", overrides.host.clone())?
            .set_override_option("provider.api_key", overrides.api_key.clone())?
            .set_override_option("agent.max_turns", overrides.max_turns.map(|n| n as u64))?
            .build()?;

        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        match result {
            Ok(settings) => {
                if settings.agent.max_turns == 0 {
                    return Err(ConfigError::InvalidValue {
                        env_var: to_env_var("agent.max_turns"),
                        reason: "must be at least 1".to_string(),
                    });
                }
                tracing::debug!(model = settings.provider.model(), "loaded settings");
                Ok(settings)
            }
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                // Extract field name from error message "missing field `type`"
                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    let field = error_str
                        .trim_start_matches("missing field `")
                        .trim_end_matches('`');
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else if let config::ConfigError::NotFound(field) = &err {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("stormcrow").join("config.toml"))
}

fn default_openai_host() -> String {
    openai::OPENAI_HOST.to_string()
}

fn default_openai_model() -> String {
    openai::OPENAI_MODEL.to_string()
}

fn default_ollama_host() -> String {
    ollama::OLLAMA_HOST.to_string()
}

fn default_ollama_model() -> String {
    ollama::OLLAMA_MODEL.to_string()
}

fn default_max_turns() -> usize {
    DEFAULT_MAX_TURNS
}

fn default_weather_host() -> String {
    WEATHER_HOST.to_string()
}

fn default_weather_timeout() -> u64 {
    WEATHER_TIMEOUT.as_secs()
}
