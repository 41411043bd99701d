//! LLM-based relation extraction
//!
//! Prompts a language model for (subject, predicate, object) triples and
//! parses the JSON array it answers with.

use std::sync::OnceLock;

use async_trait::async_trait;
use biorex_core::{BiorexError, ExtractionGateway, LlmClient, RelationTriple, Result};
use regex::Regex;
use serde::Deserialize;

/// First `[` to last `]`, across lines
const JSON_ARRAY_PATTERN: &str = r"(?s)\[.*\]";

fn json_array_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(JSON_ARRAY_PATTERN).expect("JSON array pattern is valid"))
}

/// Configuration for LLM-based extraction
#[derive(Debug, Clone)]
pub struct LlmGatewayConfig {
    /// System prompt
    pub system_prompt: String,
}

impl Default for LlmGatewayConfig {
    fn default() -> Self {
        Self {
            system_prompt: include_str!("prompts/re_system.txt").to_string(),
        }
    }
}

/// Relation structure for LLM JSON output
#[derive(Debug, Deserialize)]
struct LlmRelation {
    subject: String,
    predicate: String,
    object: String,
}

/// Extraction gateway backed by an LLM
pub struct LlmGateway {
    client: Box<dyn LlmClient>,
    pub config: LlmGatewayConfig,
}

impl LlmGateway {
    /// Create an LLM gateway with the default prompt
    pub fn new(client: Box<dyn LlmClient>) -> Self {
        Self::with_config(client, LlmGatewayConfig::default())
    }

    /// Create with custom config
    pub fn with_config(client: Box<dyn LlmClient>, config: LlmGatewayConfig) -> Self {
        Self { client, config }
    }

    /// Build the extraction prompt
    pub fn build_prompt(&self, text: &str) -> String {
        format!(
            "{}\n\nPassage:\n{}\n\nRelations (JSON array):",
            self.config.system_prompt.trim_end(),
            text
        )
    }

    /// Parse an LLM reply into triples
    ///
    /// Prose or code fences around the array are ignored. Entries with a
    /// blank field are dropped; anything that is not a JSON array of
    /// relation objects is an extraction error.
    pub fn parse_response(&self, response: &str) -> Result<Vec<RelationTriple>> {
        let array = json_array_regex()
            .find(response)
            .map(|m| m.as_str())
            .ok_or_else(|| {
                BiorexError::Extraction("model reply contains no JSON array".to_string())
            })?;

        let parsed: Vec<LlmRelation> = serde_json::from_str(array).map_err(|e| {
            BiorexError::Extraction(format!("model reply is not a relation list: {e}"))
        })?;

        Ok(parsed
            .into_iter()
            .filter_map(|r| {
                let subject = r.subject.trim();
                let predicate = r.predicate.trim();
                let object = r.object.trim();
                if subject.is_empty() || predicate.is_empty() || object.is_empty() {
                    return None;
                }
                Some(RelationTriple::new(subject, predicate, object))
            })
            .collect())
    }
}

#[async_trait]
impl ExtractionGateway for LlmGateway {
    async fn extract(&self, text: &str) -> Result<Vec<RelationTriple>> {
        let prompt = self.build_prompt(text);
        let reply = self
            .client
            .generate(&prompt)
            .await
            .map_err(|e| BiorexError::Extraction(e.to_string()))?;

        let triples = self.parse_response(&reply)?;
        tracing::debug!(count = triples.len(), "Parsed relations from model reply");
        Ok(triples)
    }

    fn name(&self) -> &str {
        "llm"
    }
}

// ============================================================================
// Tests
// ============================================================================
