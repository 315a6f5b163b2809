pub mod catalog;
pub mod classifier;
pub mod history;
pub mod orchestrator;

pub use catalog::{CatalogLoader, RotationSnapshot};
pub use classifier::{ClassifiedCv, Page, PoolSummary};
pub use history::{AssignmentHistory, HistoryEntry, HistoryStatus};
pub use orchestrator::{MutationOutcome, Orchestrator, PlannedSpan};
