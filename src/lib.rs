//! Claim Mapper - loss-run column mapping and claim summary export
//!
//! This library loads a loss-run worksheet, maps its columns onto a fixed claim
//! schema, combines it with mod/payroll figures for five policy years, and
//! exports a workbook with the remapped data, an open/closed/incurred summary,
//! and a mod history.
//!
//! # Example
//!
//! ```no_run
//! use claim_mapper::mapping::InternalField;
//! use claim_mapper::mod_form::HistoryInput;
//! use claim_mapper::session::Session;
//! use std::path::Path;
//!
//! let mut session = Session::upload("loss_run.xlsx")?;
//! session.select(InternalField::PolicyYear, Some("PolYr"))?;
//! session.select(InternalField::Status, Some("ClaimStat"))?;
//! session.select(InternalField::BodyPartCategory, Some("Body"))?;
//! session.select(InternalField::InjuryCauseCategory, Some("Cause"))?;
//! session.select(InternalField::Incurred, Some("Inc"))?;
//!
//! session.mod_form.set_projection("2025", "95");
//! session.mod_form.set_history(0, HistoryInput::new(None, "100", "1200000"))?;
//!
//! let (report, path) = session.export(Path::new("."))?;
//! println!("{} summary rows written to {}", report.summary.len(), path.display());
//! # Ok::<(), claim_mapper::error::ClaimMapError>(())
//! ```

pub mod cli;
pub mod core;
pub mod error;
pub mod excel;
pub mod mapping;
pub mod mod_form;
pub mod parser;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use error::{ClaimMapError, ClaimMapResult};
pub use mapping::{ColumnMapping, InternalField};
pub use session::Session;
pub use types::{CellValue, Column, LossRunTable};
