//! Deadline policy for extraction gateways
//!
//! Sessions never time out an extraction themselves. Hosts that need a
//! bound wrap their gateway here, turning an overlong wait into an
//! ordinary extraction failure.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use biorex_core::{BiorexError, ExtractionGateway, RelationTriple, Result};

/// Gateway decorator that fails extractions exceeding a deadline
pub struct TimeoutGateway {
    inner: Arc<dyn ExtractionGateway>,
    timeout: Duration,
}

impl TimeoutGateway {
    pub fn new(inner: Arc<dyn ExtractionGateway>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl ExtractionGateway for TimeoutGateway {
    async fn extract(&self, text: &str) -> Result<Vec<RelationTriple>> {
        match tokio::time::timeout(self.timeout, self.inner.extract(text)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    gateway = self.inner.name(),
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Extraction timed out"
                );
                Err(BiorexError::Extraction(format!(
                    "timed out after {:.1}s",
                    self.timeout.as_secs_f64()
                )))
            }
        }
    }

    fn name(&self) -> &str {
        "timeout"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DemoGateway;

    #[tokio::test(start_paused = true)]
    async fn test_slow_gateway_times_out() {
        let slow = Arc::new(DemoGateway::new(Duration::from_secs(10)));
        let gateway = TimeoutGateway::new(slow, Duration::from_secs(1));

        let err = gateway.extract("GeneA").await.unwrap_err();
        assert!(matches!(err, BiorexError::Extraction(ref msg) if msg.contains("timed out")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_gateway_passes_through() {
        let fast = Arc::new(DemoGateway::new(Duration::from_millis(100)));
        let gateway = TimeoutGateway::new(fast, Duration::from_secs(1));

        let triples = gateway.extract("GeneA").await.unwrap();
        assert_eq!(triples.len(), 5);
    }
}
