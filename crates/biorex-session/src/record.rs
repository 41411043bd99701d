//! Submission records
//!
//! One record per user request: the passage, the categories chosen when it
//! was submitted, and what extraction eventually produced.

use biorex_core::RelationTriple;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable position of a record within its session history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub usize);

impl RecordId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of extracting relations for one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    /// Extraction still running
    Pending,
    /// Extraction finished with these triples (unfiltered)
    Resolved { triples: Vec<RelationTriple> },
    /// Extraction failed
    Failed { reason: String },
}

impl ExtractionOutcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    /// Short label used in logs and events
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolved { .. } => "resolved",
            Self::Failed { .. } => "failed",
        }
    }
}

/// One user request and its eventual extraction outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: RecordId,
    pub input_text: String,
    /// Categories selected at submission time; empty means show everything
    pub selected_categories: Vec<String>,
    pub outcome: ExtractionOutcome,
    pub submitted_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SubmissionRecord {
    pub(crate) fn pending(id: RecordId, input_text: String, selected_categories: Vec<String>) -> Self {
        Self {
            id,
            input_text,
            selected_categories,
            outcome: ExtractionOutcome::Pending,
            submitted_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Extracted triples, if extraction succeeded
    pub fn triples(&self) -> Option<&[RelationTriple]> {
        match &self.outcome {
            ExtractionOutcome::Resolved { triples } => Some(triples),
            _ => None,
        }
    }

    /// Extracted triples restricted to the record's selected categories
    pub fn filtered_triples(&self) -> Option<Vec<RelationTriple>> {
        self.triples()
            .map(|triples| biorex_extractor::filter_relations(triples, &self.selected_categories))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_pending() {
        let record = SubmissionRecord::pending(RecordId(0), "GeneA".to_string(), vec![]);
        assert!(record.outcome.is_pending());
        assert!(record.triples().is_none());
        assert!(record.filtered_triples().is_none());
        assert!(record.completed_at.is_none());
    }

    #[test]
    fn test_filtered_triples_use_selection() {
        let mut record =
            SubmissionRecord::pending(RecordId(3), "text".to_string(), vec!["Drugs".to_string()]);
        record.outcome = ExtractionOutcome::Resolved {
            triples: biorex_extractor::demonstration_triples(),
        };

        let filtered = record.filtered_triples().unwrap();
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|t| t.subject == "DrugX"));
        assert_eq!(record.triples().unwrap().len(), 5);
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = ExtractionOutcome::Failed {
            reason: "timed out".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "timed out");

        let id = serde_json::to_value(RecordId(7)).unwrap();
        assert_eq!(id, serde_json::json!(7));
    }
}
