#![forbid(unsafe_code)]

//! Core domain model and business logic for the Mint lifestyle tracker.
//!
//! This crate provides:
//! - Domain types (cycle records, symptoms, predictions, calendar cells)
//! - The cycle engine (prediction, phase classification, day kinds)
//! - Month grid generation
//! - Rolling average maintenance
//! - Expense/income ledger statistics
//! - Persistence (key-value store, JSON/CSV export)

pub mod types;
pub mod error;
pub mod dates;
pub mod config;
pub mod logging;
pub mod cycle;
pub mod calendar;
pub mod history;
pub mod categories;
pub mod ledger;
pub mod store;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use dates::{format_date, parse_date};
pub use cycle::{classify_phase, display_class, predict, DayKinds};
pub use calendar::month_grid;
pub use ledger::{Ledger, Period};
pub use store::{FileStore, KeyValueStore, MemoryStore};
