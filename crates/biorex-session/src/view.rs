//! History view model
//!
//! Turns session records into what a user sees: newest submission first,
//! the category selection spelled out, and the extracted relations filtered
//! and numbered as table rows. Hosts serialize it or print
//! [`render_text`].

use std::fmt::Write as _;

use serde::Serialize;

use crate::record::{ExtractionOutcome, RecordId, SubmissionRecord};

/// Label shown when no category is selected
pub const ALL_CATEGORIES_LABEL: &str = "All";

/// Message shown when filtering leaves no relations
pub const NO_MATCHES_MESSAGE: &str = "No matching relations found for the selected entities.";

/// One row of the relations table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationRow {
    /// 1-based row number
    pub index: usize,
    pub entity_1: String,
    pub entity_2: String,
    pub relation_type: String,
}

/// What is displayed under a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryStatus {
    Processing,
    Relations { rows: Vec<RelationRow> },
    NoMatches,
    Failed { reason: String },
}

/// A rendered submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryView {
    pub record_id: RecordId,
    pub input_text: String,
    pub selected_entities: String,
    #[serde(flatten)]
    pub status: EntryStatus,
}

impl EntryView {
    pub fn build(record: &SubmissionRecord) -> Self {
        let selected = record.selected_categories.join(", ");
        let selected_entities = if selected.is_empty() {
            ALL_CATEGORIES_LABEL.to_string()
        } else {
            selected
        };

        let status = match &record.outcome {
            ExtractionOutcome::Pending => EntryStatus::Processing,
            ExtractionOutcome::Failed { reason } => EntryStatus::Failed {
                reason: reason.clone(),
            },
            ExtractionOutcome::Resolved { .. } => {
                let rows: Vec<RelationRow> = record
                    .filtered_triples()
                    .unwrap_or_default()
                    .into_iter()
                    .enumerate()
                    .map(|(i, triple)| RelationRow {
                        index: i + 1,
                        entity_1: triple.subject,
                        entity_2: triple.object,
                        relation_type: triple.predicate,
                    })
                    .collect();
                if rows.is_empty() {
                    EntryStatus::NoMatches
                } else {
                    EntryStatus::Relations { rows }
                }
            }
        };

        Self {
            record_id: record.id,
            input_text: record.input_text.clone(),
            selected_entities,
            status,
        }
    }

    /// Plain-text rendering of this entry
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Input Text: {}", self.input_text);
        let _ = writeln!(out, "Selected Entities: {}", self.selected_entities);

        match &self.status {
            EntryStatus::Processing => {
                let _ = writeln!(out, "_Processing..._");
            }
            EntryStatus::NoMatches => {
                let _ = writeln!(out, "_{NO_MATCHES_MESSAGE}_");
            }
            EntryStatus::Failed { reason } => {
                let _ = writeln!(out, "_Extraction failed: {reason}_");
            }
            EntryStatus::Relations { rows } => {
                let _ = writeln!(out, "#### Extracted Relations");
                render_table(&mut out, rows);
            }
        }
        out
    }
}

fn render_table(out: &mut String, rows: &[RelationRow]) {
    let headers = ["", "Entity 1", "Entity 2", "Relation Type"];
    let cells: Vec<[String; 4]> = rows
        .iter()
        .map(|r| {
            [
                r.index.to_string(),
                r.entity_1.clone(),
                r.entity_2.clone(),
                r.relation_type.clone(),
            ]
        })
        .collect();

    let mut widths = headers.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |out: &mut String, values: [&str; 4]| {
        let padded: Vec<String> = values
            .iter()
            .zip(widths)
            .map(|(v, w)| format!("{v:<w$}"))
            .collect();
        let _ = writeln!(out, "| {} |", padded.join(" | "));
    };

    line(&mut *out, headers);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "|-{}-|", rule.join("-|-"));
    for row in &cells {
        line(&mut *out, [&row[0], &row[1], &row[2], &row[3]]);
    }
}

/// Session history as displayed, newest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryView {
    pub entries: Vec<EntryView>,
}

impl HistoryView {
    /// Build from records in insertion order
    pub fn build(records: &[SubmissionRecord]) -> Self {
        Self {
            entries: records.iter().rev().map(EntryView::build).collect(),
        }
    }
}

/// Plain-text rendering of a whole history
pub fn render_text(view: &HistoryView) -> String {
    let divider = "-".repeat(60);
    view.entries
        .iter()
        .map(|entry| format!("{}{divider}\n", entry.render_text()))
        .collect()
}
