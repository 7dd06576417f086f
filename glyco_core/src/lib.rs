#![forbid(unsafe_code)]

//! Core domain model and business logic for the Glyco blood-glucose log.
//!
//! This crate provides:
//! - Domain types (contexts, labels, readings)
//! - Classification of readings
//! - Filter, sort and aggregation engines and the derived view
//! - Persistence (JSONL reading store, CSV export)
//! - Paginated PDF report generation

pub mod types;
pub mod error;
pub mod classify;
pub mod record;
pub mod filter;
pub mod sort;
pub mod aggregate;
pub mod view;
pub mod config;
pub mod logging;
pub mod store;
pub mod export;
pub mod report;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use classify::classify;
pub use record::{NewReading, ReadingRecord};
pub use filter::{filter, DateRange, FilterState};
pub use sort::{sort, SortDirection, SortKey, SortState};
pub use aggregate::{aggregate_by_context, summarize, ContextAverages, Summary};
pub use view::{derive_view, ViewSession, ViewStatus};
pub use config::Config;
pub use store::{JsonlStore, ReadingStore};
pub use report::{generate_report, Document, ReportSettings};
