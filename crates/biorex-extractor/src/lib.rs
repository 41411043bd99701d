//! BioREx Extractor - Relation extraction backends and entity filtering
//!
//! Implements the extraction gateways that turn biomedical text into
//! relation triples, plus the category filter applied when results
//! are displayed.

use std::sync::Arc;
use std::time::Duration;

use biorex_core::{AppConfig, ExtractionBackend, ExtractionGateway, Result};

pub mod demo;
pub mod filter;
pub mod llm;
pub mod relation;
pub mod timeout;

pub use demo::{demonstration_triples, DemoGateway};
pub use filter::{filter_relations, matches_any, normalize_category};
pub use relation::LlmGateway;
pub use timeout::TimeoutGateway;

/// Build the extraction gateway selected by `config`
///
/// The gateway is wrapped in a [`TimeoutGateway`] when
/// `extraction.timeout_secs` is set.
pub fn create_gateway(config: &AppConfig) -> Result<Arc<dyn ExtractionGateway>> {
    let gateway: Arc<dyn ExtractionGateway> = match config.extraction.backend {
        ExtractionBackend::Demo => Arc::new(DemoGateway::new(Duration::from_millis(
            config.extraction.demo_delay_ms,
        ))),
        ExtractionBackend::Llm => {
            let client = llm::create_llm_client(&config.llm)?;
            Arc::new(LlmGateway::new(client))
        }
    };

    tracing::info!(
        gateway = gateway.name(),
        timeout_secs = ?config.extraction.timeout_secs,
        "Extraction gateway configured"
    );

    Ok(match config.extraction.timeout_secs {
        Some(secs) => Arc::new(TimeoutGateway::new(gateway, Duration::from_secs(secs))),
        None => gateway,
    })
}
