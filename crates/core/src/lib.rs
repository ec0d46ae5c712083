//! bench-display-core - Shared model and dashboard state for bench-display
//!
//! This crate contains WASM-compatible code that can be shared between
//! the native client and a browser front end.
//!
//! # Features
//!
//! - Data structures for repositories, commits and benchmark artifacts
//! - Reshaping of a per-commit benchmark table into chart series
//! - Time unit formatting for measured values
//! - The dashboard selection state machine

pub mod aggregate;
pub mod data;
pub mod error;
pub mod state;
pub mod units;

pub use aggregate::{
    Aggregate, ChartPoint, ChartSeries, Chronology, EmptyState, NameSelection, ReferenceCommit,
    ViewOptions,
};
pub use data::{
    parse_document, short_id, BenchmarkDocument, BenchmarkMeasurement, BenchmarkTable, Branch,
    Commit, Repository,
};
pub use error::{Error, Result};
pub use state::{Dashboard, Effect, Event, Generation, Phase, Selection, Stage};
pub use units::format_value;
