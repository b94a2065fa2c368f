//! Transform & aggregate pipeline

pub mod mod_history;
pub mod pipeline;
pub mod policy_year;
pub mod remap;
pub mod status;
pub mod summary;

pub use mod_history::ModHistoryRow;
pub use pipeline::{build_report, ClaimReport, LITIGATION_WARNING};
pub use status::{normalize_status, ClaimStatus};
pub use summary::{ClaimSummaryRow, SUMMARY_HEADERS};
