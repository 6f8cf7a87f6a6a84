//! Environment-driven configuration assembled once at startup.
//!
//! Every tunable the service relies on lives here: store location and table
//! names, adapter endpoint addresses, the chunking/summarization numeric
//! bounds, and adapter timeouts. The loaded [`Config`] is passed down into the
//! components that need it rather than read from ambient process state, so
//! tests can construct components with explicit values.

use std::env;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_DOCUMENTS_TABLE: &str = "documents";
const DEFAULT_SUMMARIES_TABLE: &str = "summaries";
const DEFAULT_MAX_TOKENS: usize = 512;
const DEFAULT_SUMMARY_MIN_LENGTH: usize = 30;
const DEFAULT_SUMMARY_MAX_LENGTH: usize = 150;
const DEFAULT_SUMMARIZER_TIMEOUT_SECS: u64 = 120;
const DEFAULT_ADAPTER_TIMEOUT_SECS: u64 = 30;

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

/// Runtime configuration for the docdigest service.
#[derive(Debug, Clone)]
pub struct Config {
    /// Filesystem path of the SQLite database backing both stores.
    pub database_path: String,
    /// Table holding uploaded documents.
    pub documents_table: String,
    /// Table holding derived summary records.
    pub summaries_table: String,
    /// Endpoint of the OCR text extraction service.
    pub text_extractor_url: String,
    /// Endpoint of the summarization model service.
    pub summarizer_url: String,
    /// Endpoint of the named-entity-recognition model service.
    pub entity_extractor_url: String,
    /// Token budget per chunk handed to the summarization model.
    pub max_tokens: usize,
    /// Lower bound on generated summary length.
    pub summary_min_length: usize,
    /// Upper bound on generated summary length.
    pub summary_max_length: usize,
    /// Time budget for each summarization model invocation.
    pub summarizer_timeout: Duration,
    /// Time budget for extraction and entity-extraction calls.
    pub adapter_timeout: Duration,
    /// Optional tokenizer encoding override (defaults to `cl100k_base`).
    pub tokenizer_encoding: Option<String>,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load `.env` if present, then build the configuration from the
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config = Self::from_env()?;
        tracing::debug!(
            database_path = %config.database_path,
            documents_table = %config.documents_table,
            summaries_table = %config.summaries_table,
            max_tokens = config.max_tokens,
            server_port = ?config.server_port,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Build configuration from environment variables, performing validation
    /// along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_path: load_env("DATABASE_PATH")?,
            documents_table: load_table_name("DOCUMENTS_TABLE", DEFAULT_DOCUMENTS_TABLE)?,
            summaries_table: load_table_name("SUMMARIES_TABLE", DEFAULT_SUMMARIES_TABLE)?,
            text_extractor_url: load_env("TEXT_EXTRACTOR_URL")?,
            summarizer_url: load_env("SUMMARIZER_URL")?,
            entity_extractor_url: load_env("ENTITY_EXTRACTOR_URL")?,
            max_tokens: load_parsed("MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            summary_min_length: load_parsed("SUMMARY_MIN_LENGTH", DEFAULT_SUMMARY_MIN_LENGTH)?,
            summary_max_length: load_parsed("SUMMARY_MAX_LENGTH", DEFAULT_SUMMARY_MAX_LENGTH)?,
            summarizer_timeout: Duration::from_secs(load_parsed(
                "SUMMARIZER_TIMEOUT_SECS",
                DEFAULT_SUMMARIZER_TIMEOUT_SECS,
            )?),
            adapter_timeout: Duration::from_secs(load_parsed(
                "ADAPTER_TIMEOUT_SECS",
                DEFAULT_ADAPTER_TIMEOUT_SECS,
            )?),
            tokenizer_encoding: load_env_optional("TOKENIZER_ENCODING"),
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

fn load_parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Table names are spliced into SQL statements, so they must be plain
/// identifiers rather than arbitrary strings.
fn load_table_name(key: &str, default: &str) -> Result<String, ConfigError> {
    let value = load_env_optional(key).unwrap_or_else(|| default.to_string());
    let mut chars = value.chars();
    let valid_head = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_head && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_name_accepts_plain_identifiers() {
        assert!(load_table_name("DOCDIGEST_TEST_UNSET_TABLE", "documents").is_ok());
        assert!(load_table_name("DOCDIGEST_TEST_UNSET_TABLE", "summaries_v2").is_ok());
    }

    #[test]
    fn table_name_rejects_sql_fragments() {
        // SAFETY: Tests set process-scoped variables with unique names upfront.
        unsafe { env::set_var("DOCDIGEST_TEST_BAD_TABLE", "docs; DROP TABLE x") };
        let error = load_table_name("DOCDIGEST_TEST_BAD_TABLE", "documents").unwrap_err();
        assert!(matches!(error, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn parsed_values_fall_back_to_defaults() {
        let value: usize = load_parsed("DOCDIGEST_TEST_UNSET_NUMBER", 512).expect("default");
        assert_eq!(value, 512);
    }
}
