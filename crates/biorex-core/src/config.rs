//! BioREx Configuration Management
//!
//! Handles configuration from environment variables and TOML config files
//! with sensible defaults for development.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::DEFAULT_ENTITY_CATEGORIES;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Extraction backend selection
    pub extraction: ExtractionConfig,

    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Session behaviour
    pub session: SessionConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_override()
    }

    /// Apply every override `var` yields on top of `self`
    fn with_overrides(
        mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        // Server
        if let Some(host) = var("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("API_PORT") {
            self.server.port = parse_value("API_PORT", port)?;
        }
        if let Some(origins) = var("CORS_ORIGINS") {
            self.server.cors_origins = split_list(&origins);
        }

        // Extraction
        if let Some(backend) = var("EXTRACTION_BACKEND") {
            self.extraction.backend = backend.parse()?;
        }
        if let Some(delay) = var("DEMO_DELAY_MS") {
            self.extraction.demo_delay_ms = parse_value("DEMO_DELAY_MS", delay)?;
        }
        if let Some(timeout) = var("EXTRACTION_TIMEOUT_SECS") {
            self.extraction.timeout_secs = Some(parse_value("EXTRACTION_TIMEOUT_SECS", timeout)?);
        }

        // LLM
        if let Some(provider) = var("LLM_PROVIDER") {
            self.llm.provider = provider.parse()?;
        }
        if let Some(key) = var("OPENAI_API_KEY") {
            self.llm.openai_api_key = Some(key);
        }
        if let Some(url) = var("OPENAI_BASE_URL") {
            self.llm.openai_base_url = Some(url);
        }
        if let Some(url) = var("OLLAMA_URL") {
            self.llm.ollama_url = url;
        }
        if let Some(model) = var("LLM_MODEL") {
            self.llm.model = model;
        }

        // Session
        if let Some(categories) = var("ENTITY_CATEGORIES") {
            self.session.entity_categories = split_list(&categories);
        }

        // Logging
        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("LOG_FORMAT") {
            self.logging.json_format = format.eq_ignore_ascii_case("json");
        }

        Ok(self)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml_str(&content).map_err(|message| ConfigError::ParseError { path, message })
    }

    /// Parse configuration from TOML text
    fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Merge with environment variables (every variable that is set wins)
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Load from an optional file, then apply environment overrides
    pub fn load(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path)?.with_env_override(),
            None => Self::from_env(),
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_enabled: true,
            // Empty allows any origin; set via CORS_ORIGINS
            cors_origins: vec![],
        }
    }
}

/// Which extraction backend serves submissions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionBackend {
    /// Fixed demonstration triples after a simulated delay
    #[default]
    Demo,
    /// Prompted LLM
    Llm,
}

impl std::str::FromStr for ExtractionBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "demo" => Ok(Self::Demo),
            "llm" => Ok(Self::Llm),
            _ => Err(ConfigError::InvalidValue {
                key: "EXTRACTION_BACKEND".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Extraction gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Backend to use
    pub backend: ExtractionBackend,

    /// Simulated processing delay of the demo backend (milliseconds)
    pub demo_delay_ms: u64,

    /// Optional deadline for a single extraction; `None` waits indefinitely
    pub timeout_secs: Option<u64>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            backend: ExtractionBackend::Demo,
            demo_delay_ms: 2000,
            timeout_secs: None,
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// LLM provider to use
    pub provider: LlmProvider,

    /// OpenAI API key
    pub openai_api_key: Option<String>,

    /// OpenAI API base URL (for Azure or compatible APIs)
    pub openai_base_url: Option<String>,

    /// Ollama server URL
    pub ollama_url: String,

    /// Model name to use
    pub model: String,

    /// Maximum tokens for completion
    pub max_tokens: u32,

    /// Temperature for generation
    pub temperature: f32,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAI,
            openai_api_key: None,
            openai_base_url: None,
            ollama_url: "http://localhost:11434".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1024,
            temperature: 0.0,
            timeout_secs: 60,
        }
    }
}

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAI,
    Ollama,
    Azure,
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            "azure" => Ok(Self::Azure),
            _ => Err(ConfigError::InvalidValue {
                key: "LLM_PROVIDER".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Category labels offered to users for filtering
    pub entity_categories: Vec<String>,

    /// Capacity of each session's event channel
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            entity_categories: DEFAULT_ENTITY_CATEGORIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            event_capacity: 64,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.extraction.backend, ExtractionBackend::Demo);
        assert_eq!(config.extraction.demo_delay_ms, 2000);
        assert!(config.extraction.timeout_secs.is_none());
        assert_eq!(
            config.session.entity_categories,
            vec!["Genes", "Proteins", "Diseases", "Drugs", "Tissues"]
        );
    }

    #[test]
    fn test_llm_provider_parse() {
        assert_eq!(
            "openai".parse::<LlmProvider>().unwrap(),
            LlmProvider::OpenAI
        );
        assert_eq!(
            "ollama".parse::<LlmProvider>().unwrap(),
            LlmProvider::Ollama
        );
        assert!("invalid".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!(
            "LLM".parse::<ExtractionBackend>().unwrap(),
            ExtractionBackend::Llm
        );
        assert!("spacy".parse::<ExtractionBackend>().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [extraction]
            backend = "llm"
            timeout_secs = 30

            [session]
            entity_categories = ["Genes", "Pathways"]
            "#,
        )
        .unwrap();

        assert_eq!(config.extraction.backend, ExtractionBackend::Llm);
        assert_eq!(config.extraction.timeout_secs, Some(30));
        assert_eq!(config.extraction.demo_delay_ms, 2000);
        assert_eq!(config.session.entity_categories, vec!["Genes", "Pathways"]);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        assert!(AppConfig::from_toml_str("[server\nport = ").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_file("/nonexistent/biorex.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileReadError { .. }));
    }

    #[test]
    fn test_file_values_overridden_by_every_env_key() {
        let path = std::env::temp_dir().join(format!("biorex-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            r#"
            [extraction]
            backend = "llm"

            [llm]
            provider = "openai"
            model = "gpt-4o-mini"
            "#,
        )
        .unwrap();
        let from_file = AppConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let env: HashMap<&str, &str> = HashMap::from([
            ("LLM_PROVIDER", "ollama"),
            ("LLM_MODEL", "llama3"),
            ("OLLAMA_URL", "http://gpu:11434"),
            ("OPENAI_BASE_URL", "http://proxy/v1"),
            ("CORS_ORIGINS", "http://a.test, http://b.test"),
            ("LOG_FORMAT", "json"),
        ]);
        let config = from_file
            .with_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.extraction.backend, ExtractionBackend::Llm);
        assert_eq!(config.llm.provider, LlmProvider::Ollama);
        assert_eq!(config.llm.model, "llama3");
        assert_eq!(config.llm.ollama_url, "http://gpu:11434");
        assert_eq!(config.llm.openai_base_url.as_deref(), Some("http://proxy/v1"));
        assert_eq!(config.server.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert!(config.logging.json_format);
    }

    #[test]
    fn test_env_value_equal_to_default_still_wins() {
        let file = AppConfig::from_toml_str("[llm]\nprovider = \"ollama\"").unwrap();
        let config = file
            .with_overrides(|key| (key == "LLM_PROVIDER").then(|| "openai".to_string()))
            .unwrap();
        assert_eq!(config.llm.provider, LlmProvider::OpenAI);
    }

    #[test]
    fn test_invalid_override_is_reported() {
        let err = AppConfig::default()
            .with_overrides(|key| (key == "DEMO_DELAY_MS").then(|| "2s".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "DEMO_DELAY_MS"));
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(" Genes, ,Drugs "), vec!["Genes", "Drugs"]);
    }
}
