//! Session history
//!
//! Append-only list of submission records. Records are never removed or
//! reordered, so a [`RecordId`] stays valid for the whole session.

use biorex_core::{BiorexError, RelationTriple, Result};
use chrono::Utc;

use crate::record::{ExtractionOutcome, RecordId, SubmissionRecord};

/// Ordered submission records of one session, oldest first
#[derive(Debug, Default, Clone)]
pub struct SessionHistory {
    records: Vec<SubmissionRecord>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pending record for `text`
    ///
    /// Empty or whitespace-only text is rejected before anything changes.
    pub fn append(&mut self, text: &str, categories: Vec<String>) -> Result<RecordId> {
        if text.trim().is_empty() {
            return Err(BiorexError::Validation(
                "Please enter some biomedical text.".to_string(),
            ));
        }

        let id = RecordId(self.records.len());
        self.records
            .push(SubmissionRecord::pending(id, text.to_string(), categories));
        Ok(id)
    }

    /// Mark a pending record as resolved with `triples`
    pub fn resolve(&mut self, id: RecordId, triples: Vec<RelationTriple>) -> Result<()> {
        self.complete(id, ExtractionOutcome::Resolved { triples })
    }

    /// Mark a pending record as failed
    pub fn fail(&mut self, id: RecordId, reason: impl Into<String>) -> Result<()> {
        self.complete(id, ExtractionOutcome::Failed {
            reason: reason.into(),
        })
    }

    fn complete(&mut self, id: RecordId, outcome: ExtractionOutcome) -> Result<()> {
        let record = self
            .records
            .get_mut(id.index())
            .ok_or_else(|| BiorexError::NotFound(format!("record {id}")))?;

        if record.outcome.is_terminal() {
            return Err(BiorexError::InvalidState(format!(
                "record {id} is already {}",
                record.outcome.as_str()
            )));
        }

        record.outcome = outcome;
        record.completed_at = Some(Utc::now());
        Ok(())
    }

    /// All records in insertion order
    pub fn all(&self) -> &[SubmissionRecord] {
        &self.records
    }

    pub fn get(&self, id: RecordId) -> Option<&SubmissionRecord> {
        self.records.get(id.index())
    }

    /// The record still waiting for extraction, if any
    pub fn pending(&self) -> Option<&SubmissionRecord> {
        self.records.iter().rev().find(|r| r.outcome.is_pending())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
