//! BioREx Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout BioREx:
//! - Relation triples produced by extraction backends
//! - Common error types
//! - The extraction gateway and LLM client traits
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, ConfigError, ExtractionBackend, ExtractionConfig, LlmConfig, LlmProvider,
    LoggingConfig, ServerConfig, SessionConfig,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for BioREx operations
#[derive(Error, Debug)]
pub enum BiorexError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Busy: {0}")]
    Busy(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for BiorexError {
    fn from(err: ConfigError) -> Self {
        BiorexError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BiorexError>;

// ============================================================================
// Relation Triples
// ============================================================================

/// A (subject, predicate, object) fact asserted about two biomedical entities
///
/// Triples are kept exactly as the extraction backend produced them:
/// duplicates are not collapsed and no field is normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationTriple {
    /// First entity (e.g. "GeneA")
    pub subject: String,

    /// Relation text (e.g. "interacts with")
    pub predicate: String,

    /// Second entity (e.g. "ProteinB")
    pub object: String,
}

impl RelationTriple {
    /// Create a new triple
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

impl std::fmt::Display for RelationTriple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.predicate, self.object)
    }
}

/// Entity categories offered for filtering when nothing else is configured
pub const DEFAULT_ENTITY_CATEGORIES: [&str; 5] =
    ["Genes", "Proteins", "Diseases", "Drugs", "Tissues"];

// ============================================================================
// Traits
// ============================================================================

/// Boundary to a relation-extraction capability
///
/// Implementations resolve with the triples found in `text` or fail with
/// [`BiorexError::Extraction`]. Latency is unbounded; callers that need a
/// deadline wrap the gateway themselves.
#[async_trait::async_trait]
pub trait ExtractionGateway: Send + Sync {
    /// Extract relation triples from free text
    async fn extract(&self, text: &str) -> Result<Vec<RelationTriple>>;

    /// Get gateway name for logging
    fn name(&self) -> &str;
}

/// Trait for LLM clients
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response
    async fn generate(&self, prompt: &str) -> Result<String>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoGateway;

    #[async_trait::async_trait]
    impl ExtractionGateway for EchoGateway {
        async fn extract(&self, text: &str) -> Result<Vec<RelationTriple>> {
            if text.is_empty() {
                return Err(BiorexError::Extraction("nothing to read".to_string()));
            }
            Ok(vec![RelationTriple::new(text, "mentions", text)])
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn test_triple_display() {
        let triple = RelationTriple::new("GeneA", "interacts with", "ProteinB");
        assert_eq!(triple.to_string(), "(GeneA, interacts with, ProteinB)");
    }

    #[test]
    fn test_triple_serializes_with_named_fields() {
        let triple = RelationTriple::new("DrugX", "treats", "DiseaseY");
        let json = serde_json::to_value(&triple).unwrap();
        assert_eq!(json["subject"], "DrugX");
        assert_eq!(json["predicate"], "treats");
        assert_eq!(json["object"], "DiseaseY");
    }

    #[test]
    fn test_gateway_trait_object() {
        let gateway: Box<dyn ExtractionGateway> = Box::new(EchoGateway);
        let triples = tokio_test::block_on(gateway.extract("GeneA")).unwrap();
        assert_eq!(triples.len(), 1);

        let err = tokio_test::block_on(gateway.extract("")).unwrap_err();
        assert!(matches!(err, BiorexError::Extraction(_)));
    }

    #[test]
    fn test_config_error_conversion() {
        let err: BiorexError = ConfigError::MissingRequired("OPENAI_API_KEY".to_string()).into();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }
}
