//! BioREx Session - Submission history and extraction controller
//!
//! A session keeps every passage a user submitted, in order, together with
//! the relations extracted from it. Only one extraction runs at a time; the
//! [`InteractionController`] enforces that and notifies subscribers when a
//! record completes so the [`HistoryView`] can be rebuilt.

pub mod controller;
pub mod history;
pub mod record;
pub mod view;

pub use controller::{ControllerPhase, InteractionController, SessionEvent, SessionState};
pub use history::SessionHistory;
pub use record::{ExtractionOutcome, RecordId, SubmissionRecord};
pub use view::{render_text, EntryStatus, EntryView, HistoryView, RelationRow};
