use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the Aerodesk server.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Base URL of the Qdrant instance that stores document embeddings.
    pub qdrant_url: String,
    /// Name of the Qdrant collection holding the support corpus.
    pub qdrant_collection_name: String,
    /// Optional API key required to access Qdrant.
    pub qdrant_api_key: Option<String>,
    /// Optional override for the Ollama base URL (defaults to localhost).
    pub ollama_url: Option<String>,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Dimensionality of the produced vectors.
    pub embedding_dimension: usize,
    /// Chat model used for answer generation and department classification.
    pub chat_model: String,
    /// Optional override for the character budget used when chunking text.
    pub chunk_size: Option<usize>,
    /// Optional override for the corpus directory ingested at startup.
    pub corpus_dir: Option<String>,
    /// Optional endpoint of the HTTP mail relay used for escalations.
    pub mail_relay_url: Option<String>,
    /// Optional sender address stamped on escalation emails.
    pub support_from_email: Option<String>,
    /// Optional fallback address used when a department cannot be resolved.
    pub fallback_support_email: Option<String>,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            qdrant_url: load_env("QDRANT_URL")?,
            qdrant_collection_name: load_env("QDRANT_COLLECTION_NAME")?,
            qdrant_api_key: load_env_optional("QDRANT_API_KEY"),
            ollama_url: load_env_optional("OLLAMA_URL"),
            embedding_model: load_env("EMBEDDING_MODEL")?,
            embedding_dimension: load_env("EMBEDDING_DIMENSION")?
                .parse()
                .map_err(|_| ConfigError::InvalidValue("EMBEDDING_DIMENSION".to_string()))?,
            chat_model: load_env("CHAT_MODEL")?,
            chunk_size: load_env_optional("CHUNK_SIZE")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("CHUNK_SIZE".to_string()))
                })
                .transpose()?,
            corpus_dir: load_env_optional("CORPUS_DIR"),
            mail_relay_url: load_env_optional("MAIL_RELAY_URL"),
            support_from_email: load_env_optional("SUPPORT_FROM_EMAIL"),
            fallback_support_email: load_env_optional("FALLBACK_SUPPORT_EMAIL"),
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        qdrant_url = %config.qdrant_url,
        collection = %config.qdrant_collection_name,
        server_port = ?config.server_port,
        chat_model = %config.chat_model,
        embedding_model = %config.embedding_model,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
