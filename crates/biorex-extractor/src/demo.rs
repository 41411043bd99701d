//! Demonstration extraction backend
//!
//! Stands in for a real model: waits for a fixed delay, then returns the
//! same five relations regardless of the submitted text.

use std::time::Duration;

use async_trait::async_trait;
use biorex_core::{ExtractionGateway, RelationTriple, Result};

/// The fixed relation set returned by [`DemoGateway`]
pub fn demonstration_triples() -> Vec<RelationTriple> {
    vec![
        RelationTriple::new("GeneA", "interacts with", "ProteinB"),
        RelationTriple::new("DrugX", "treats", "DiseaseY"),
        RelationTriple::new("ProteinC", "associated with", "DiseaseZ"),
        RelationTriple::new("GeneA", "expressed in", "TissueY"),
        RelationTriple::new("DrugX", "inhibits", "ProteinB"),
    ]
}

/// Gateway that simulates processing time and returns demonstration triples
#[derive(Debug, Clone)]
pub struct DemoGateway {
    delay: Duration,
}

impl DemoGateway {
    /// Create a demo gateway with the given simulated delay
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Demo gateway that answers immediately
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl Default for DemoGateway {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

#[async_trait]
impl ExtractionGateway for DemoGateway {
    async fn extract(&self, text: &str) -> Result<Vec<RelationTriple>> {
        tracing::debug!(
            chars = text.chars().count(),
            delay_ms = self.delay.as_millis() as u64,
            "Simulating relation extraction"
        );
        tokio::time::sleep(self.delay).await;
        Ok(demonstration_triples())
    }

    fn name(&self) -> &str {
        "demo"
    }
}
