//! Session handlers
//!
//! One session per client: submissions go through the session's
//! single-flight controller, history is returned already filtered and
//! newest first, and completions are pushed over Server-Sent Events.
//!
//! Author: hephaex@gmail.com

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use biorex_core::RelationTriple;
use biorex_session::{
    ControllerPhase, EntryStatus, EntryView, ExtractionOutcome, HistoryView, InteractionController,
    RecordId, SubmissionRecord,
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use utoipa::ToSchema;
use uuid::Uuid;

// ============================================================================
// DTOs
// ============================================================================

/// Created session
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
}

/// Submission request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitRequest {
    /// Biomedical passage
    #[schema(example = "GeneA interacts with ProteinB.")]
    pub text: String,

    /// Entity categories to display relations for; empty shows all
    #[serde(default)]
    #[schema(example = json!(["Genes"]))]
    pub categories: Vec<String>,
}

/// Accepted submission
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitResponse {
    #[schema(example = 0)]
    pub record_id: usize,
    #[schema(example = "pending")]
    pub status: String,
}

/// Relation triple
#[derive(Debug, Serialize, ToSchema)]
pub struct TripleDto {
    #[schema(example = "GeneA")]
    pub subject: String,
    #[schema(example = "interacts with")]
    pub predicate: String,
    #[schema(example = "ProteinB")]
    pub object: String,
}

impl From<RelationTriple> for TripleDto {
    fn from(t: RelationTriple) -> Self {
        Self {
            subject: t.subject,
            predicate: t.predicate,
            object: t.object,
        }
    }
}

/// Table row of a rendered history entry
#[derive(Debug, Serialize, ToSchema)]
pub struct RelationRowDto {
    /// 1-based row number
    pub index: usize,
    pub entity_1: String,
    pub entity_2: String,
    pub relation_type: String,
}

/// Rendered history entry
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryEntry {
    pub record_id: usize,
    pub input_text: String,
    /// Selected categories joined by ", ", or "All"
    #[schema(example = "Genes")]
    pub selected_entities: String,
    /// processing, relations, no_matches or failed
    #[schema(example = "relations")]
    pub status: String,
    pub rows: Vec<RelationRowDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<EntryView> for HistoryEntry {
    fn from(entry: EntryView) -> Self {
        let (status, rows, message) = match entry.status {
            EntryStatus::Processing => ("processing", Vec::new(), Some("Processing...".to_string())),
            EntryStatus::NoMatches => (
                "no_matches",
                Vec::new(),
                Some(biorex_session::view::NO_MATCHES_MESSAGE.to_string()),
            ),
            EntryStatus::Failed { reason } => ("failed", Vec::new(), Some(reason)),
            EntryStatus::Relations { rows } => (
                "relations",
                rows.into_iter()
                    .map(|r| RelationRowDto {
                        index: r.index,
                        entity_1: r.entity_1,
                        entity_2: r.entity_2,
                        relation_type: r.relation_type,
                    })
                    .collect(),
                None,
            ),
        };

        Self {
            record_id: entry.record_id.index(),
            input_text: entry.input_text,
            selected_entities: entry.selected_entities,
            status: status.to_string(),
            rows,
            message,
        }
    }
}

/// Session history, newest first
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub session_id: Uuid,
    /// True while an extraction is running
    pub busy: bool,
    pub entries: Vec<HistoryEntry>,
}

/// Full record including unfiltered triples
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordResponse {
    pub record_id: usize,
    pub input_text: String,
    pub selected_categories: Vec<String>,
    /// pending, resolved or failed
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triples: Option<Vec<TripleDto>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtered_triples: Option<Vec<TripleDto>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub submitted_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl From<SubmissionRecord> for RecordResponse {
    fn from(record: SubmissionRecord) -> Self {
        let filtered_triples = record
            .filtered_triples()
            .map(|t| t.into_iter().map(TripleDto::from).collect());
        let status = record.outcome.as_str().to_string();
        let (triples, reason) = match record.outcome {
            ExtractionOutcome::Pending => (None, None),
            ExtractionOutcome::Resolved { triples } => {
                (Some(triples.into_iter().map(TripleDto::from).collect()), None)
            }
            ExtractionOutcome::Failed { reason } => (None, Some(reason)),
        };

        Self {
            record_id: record.id.index(),
            input_text: record.input_text,
            selected_categories: record.selected_categories,
            status,
            triples,
            filtered_triples,
            reason,
            submitted_at: record.submitted_at.to_rfc3339(),
            completed_at: record.completed_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Entity category options
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoriesResponse {
    #[schema(example = json!(["Genes", "Proteins", "Diseases", "Drugs", "Tissues"]))]
    pub categories: Vec<String>,
}

async fn find_session(state: &AppState, id: Uuid) -> Result<InteractionController, AppError> {
    state
        .session(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id}")))
}

// ============================================================================
// Handlers
// ============================================================================

/// List the entity categories users can filter by
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    tag = "sessions",
    responses(
        (status = 200, description = "Category options", body = CategoriesResponse)
    )
)]
pub async fn list_categories(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.increment_requests();
    Json(CategoriesResponse {
        categories: state.config.session.entity_categories.clone(),
    })
}

/// Start a new session with an empty history
#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    tag = "sessions",
    responses(
        (status = 201, description = "Session created", body = CreateSessionResponse)
    )
)]
pub async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.increment_requests();
    let session_id = state.create_session().await;
    (StatusCode::CREATED, Json(CreateSessionResponse { session_id }))
}

/// Discard a session and its history
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{id}",
    tag = "sessions",
    params(
        ("id" = Uuid, Path, description = "Session UUID")
    ),
    responses(
        (status = 204, description = "Session ended"),
        (status = 404, description = "Session not found", body = crate::error::ApiError)
    )
)]
pub async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();
    if state.end_session(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {id}")))
    }
}

/// Submit a passage for relation extraction
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/submissions",
    tag = "sessions",
    params(
        ("id" = Uuid, Path, description = "Session UUID")
    ),
    request_body = SubmitRequest,
    responses(
        (status = 202, description = "Extraction started", body = SubmitResponse),
        (status = 400, description = "Empty text", body = crate::error::ApiError),
        (status = 404, description = "Session not found", body = crate::error::ApiError),
        (status = 409, description = "Another extraction is running", body = crate::error::ApiError)
    )
)]
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    let session = find_session(&state, id).await?;
    let record_id = session.submit(&req.text, req.categories).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            record_id: record_id.index(),
            status: "pending".to_string(),
        }),
    ))
}

/// Rendered session history, newest first
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}/history",
    tag = "sessions",
    params(
        ("id" = Uuid, Path, description = "Session UUID")
    ),
    responses(
        (status = 200, description = "Session history", body = HistoryResponse),
        (status = 404, description = "Session not found", body = crate::error::ApiError)
    )
)]
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    let snapshot = find_session(&state, id).await?.snapshot().await;
    let view = HistoryView::build(snapshot.history.all());

    Ok(Json(HistoryResponse {
        session_id: id,
        busy: matches!(snapshot.phase, ControllerPhase::Extracting(_)),
        entries: view.entries.into_iter().map(HistoryEntry::from).collect(),
    }))
}

/// One record with its unfiltered and filtered triples
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}/records/{record_id}",
    tag = "sessions",
    params(
        ("id" = Uuid, Path, description = "Session UUID"),
        ("record_id" = usize, Path, description = "Record index within the session")
    ),
    responses(
        (status = 200, description = "Submission record", body = RecordResponse),
        (status = 404, description = "Session or record not found", body = crate::error::ApiError)
    )
)]
pub async fn get_record(
    State(state): State<Arc<AppState>>,
    Path((id, record_id)): Path<(Uuid, usize)>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    let record = find_session(&state, id)
        .await?
        .record(RecordId(record_id))
        .await
        .ok_or_else(|| AppError::NotFound(format!("Record {record_id}")))?;

    Ok(Json(RecordResponse::from(record)))
}

/// Stream session events (submitted / completed) as Server-Sent Events
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}/events",
    tag = "sessions",
    params(
        ("id" = Uuid, Path, description = "Session UUID")
    ),
    responses(
        (status = 200, description = "Event stream started"),
        (status = 404, description = "Session not found", body = crate::error::ApiError)
    )
)]
pub async fn session_events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    state.increment_requests();

    let receiver = find_session(&state, id).await?.subscribe();

    let stream = stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let data = serde_json::to_string(&event).unwrap_or_default();
                    let sse = Event::default().event(event.name()).data(data);
                    return Some((Ok(sse), receiver));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Event subscriber lagged");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}
