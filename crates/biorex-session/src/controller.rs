//! Interaction controller
//!
//! Drives at most one extraction at a time for a session. A submission
//! appends a pending record and starts the gateway call on a background
//! task; when the call finishes the record is resolved or failed and a
//! [`SessionEvent`] is broadcast so views can re-render.

use std::sync::Arc;

use biorex_core::{BiorexError, ExtractionGateway, RelationTriple, Result};
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};

use crate::history::SessionHistory;
use crate::record::{RecordId, SubmissionRecord};

/// Default capacity of a session's event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Whether the session has an extraction in flight
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "record_id", rename_all = "snake_case")]
pub enum ControllerPhase {
    #[default]
    Idle,
    Extracting(RecordId),
}

/// History plus controller phase, mutated together under one lock
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub history: SessionHistory,
    pub phase: ControllerPhase,
}

/// Notifications emitted as a session changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A record was appended and its extraction started
    Submitted { record_id: RecordId },
    /// A record reached its terminal outcome
    Completed {
        record_id: RecordId,
        status: &'static str,
    },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submitted { .. } => "submitted",
            Self::Completed { .. } => "completed",
        }
    }
}

struct ControllerInner {
    state: RwLock<SessionState>,
    gateway: Arc<dyn ExtractionGateway>,
    events: broadcast::Sender<SessionEvent>,
}

/// Single-flight controller owning one session's state
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct InteractionController {
    inner: Arc<ControllerInner>,
}

impl InteractionController {
    /// Create an idle controller with an empty history
    pub fn new(gateway: Arc<dyn ExtractionGateway>) -> Self {
        Self::with_event_capacity(gateway, DEFAULT_EVENT_CAPACITY)
    }

    /// Create with a custom event channel capacity
    pub fn with_event_capacity(gateway: Arc<dyn ExtractionGateway>, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(ControllerInner {
                state: RwLock::new(SessionState::default()),
                gateway,
                events,
            }),
        }
    }

    /// Submit a passage for extraction
    ///
    /// Fails with [`BiorexError::Validation`] for blank text and with
    /// [`BiorexError::Busy`] while another extraction is running; neither
    /// case touches the history. On success the extraction runs in the
    /// background and the new record's id is returned immediately.
    pub async fn submit(&self, text: &str, categories: Vec<String>) -> Result<RecordId> {
        let id = {
            let mut state = self.inner.state.write().await;
            if let ControllerPhase::Extracting(pending) = state.phase {
                tracing::warn!(pending = %pending, "Submission rejected: extraction in progress");
                return Err(BiorexError::Busy(format!(
                    "extraction for record {pending} is still running"
                )));
            }

            let id = state.history.append(text, categories)?;
            state.phase = ControllerPhase::Extracting(id);
            id
        };

        tracing::info!(
            record = %id,
            gateway = self.inner.gateway.name(),
            "Submission accepted, extracting relations"
        );
        let _ = self.inner.events.send(SessionEvent::Submitted { record_id: id });

        let inner = Arc::clone(&self.inner);
        let text = text.to_string();
        tokio::spawn(async move {
            let gateway = Arc::clone(&inner.gateway);
            // A panicking gateway must still release the extraction slot
            let result = match tokio::spawn(async move { gateway.extract(&text).await }).await {
                Ok(result) => result,
                Err(e) => Err(BiorexError::Extraction(format!("extraction task aborted: {e}"))),
            };
            inner.finish(id, result).await;
        });

        Ok(id)
    }

    /// Snapshot of every record, oldest first
    pub async fn history(&self) -> Vec<SubmissionRecord> {
        self.inner.state.read().await.history.all().to_vec()
    }

    /// Snapshot of a single record
    pub async fn record(&self, id: RecordId) -> Option<SubmissionRecord> {
        self.inner.state.read().await.history.get(id).cloned()
    }

    /// Consistent copy of history and phase
    pub async fn snapshot(&self) -> SessionState {
        self.inner.state.read().await.clone()
    }

    pub async fn phase(&self) -> ControllerPhase {
        self.inner.state.read().await.phase
    }

    pub async fn is_busy(&self) -> bool {
        matches!(self.phase().await, ControllerPhase::Extracting(_))
    }

    /// Receive events for everything that happens after this call
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Wait until the record has a terminal outcome and return it
    pub async fn wait_for(&self, id: RecordId) -> Result<SubmissionRecord> {
        // Subscribe before looking, so a completion in between is not lost
        let mut events = self.subscribe();
        loop {
            {
                let state = self.inner.state.read().await;
                let record = state
                    .history
                    .get(id)
                    .ok_or_else(|| BiorexError::NotFound(format!("record {id}")))?;
                if record.outcome.is_terminal() {
                    return Ok(record.clone());
                }
            }

            match events.recv().await {
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(BiorexError::InvalidState("session closed".to_string()))
                }
            }
        }
    }
}

impl ControllerInner {
    async fn finish(&self, id: RecordId, result: Result<Vec<RelationTriple>>) {
        let status = {
            let mut state = self.state.write().await;
            let applied = match result {
                Ok(triples) => {
                    tracing::info!(record = %id, relations = triples.len(), "Extraction finished");
                    state.history.resolve(id, triples)
                }
                Err(e) => {
                    tracing::warn!(record = %id, error = %e, "Extraction failed");
                    state.history.fail(id, e.to_string())
                }
            };
            if let Err(e) = applied {
                tracing::error!(record = %id, error = %e, "Could not record extraction outcome");
            }
            state.phase = ControllerPhase::Idle;
            state
                .history
                .get(id)
                .map(|r| r.outcome.as_str())
                .unwrap_or("failed")
        };

        let _ = self.events.send(SessionEvent::Completed {
            record_id: id,
            status,
        });
    }
}
