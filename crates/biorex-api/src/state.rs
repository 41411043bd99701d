//! Application state management
//!
//! Author: hephaex@gmail.com

use biorex_core::config::AppConfig;
use biorex_core::ExtractionGateway;
use biorex_session::InteractionController;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Request counter
    pub request_count: AtomicU64,
    /// Ready status
    pub is_ready: AtomicBool,
    /// Extraction gateway shared by all sessions
    pub gateway: Arc<dyn ExtractionGateway>,
    /// Live sessions, each with its own history and extraction slot
    pub sessions: RwLock<HashMap<Uuid, InteractionController>>,
}

impl AppState {
    /// Create new application state with config and gateway
    pub fn new(config: AppConfig, gateway: Arc<dyn ExtractionGateway>) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
            is_ready: AtomicBool::new(true),
            gateway,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    /// Get total request count
    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Check if service is ready
    pub fn is_ready(&self) -> bool {
        self.is_ready.load(Ordering::SeqCst)
    }

    /// Set ready status
    pub fn set_ready(&self, ready: bool) {
        self.is_ready.store(ready, Ordering::SeqCst);
    }

    /// Start a new empty session
    pub async fn create_session(&self) -> Uuid {
        let id = Uuid::new_v4();
        let controller = InteractionController::with_event_capacity(
            Arc::clone(&self.gateway),
            self.config.session.event_capacity,
        );
        self.sessions.write().await.insert(id, controller);
        tracing::info!(session = %id, "Session started");
        id
    }

    /// Look up a session's controller
    pub async fn session(&self, id: Uuid) -> Option<InteractionController> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Discard a session; returns false if it did not exist
    ///
    /// An extraction still running for the session finishes in the
    /// background and is then dropped with the rest of its state.
    pub async fn end_session(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            tracing::info!(session = %id, "Session ended");
        }
        removed
    }

    /// Number of live sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
