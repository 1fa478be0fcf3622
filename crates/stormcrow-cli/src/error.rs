use thiserror::Error;

pub const ENV_PREFIX: &str = "STORMCROW";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting. Please set {env_var}")]
    MissingEnvVar { env_var: String },

    #[error("Invalid value for {env_var}: {reason}")]
    InvalidValue { env_var: String, reason: String },

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Map a dotted settings key to the environment variable that sets it
pub fn to_env_var(field: &str) -> String {
    format!("{}_{}", ENV_PREFIX, field.to_uppercase().replace('.', "__"))
}
