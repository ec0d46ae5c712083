//! bench-display - Browse per-commit micro-benchmark results of GitHub repositories
//!
//! Benchmark CI uploads one JSON artifact per commit to a public object
//! store. This library lists an owner's repositories, branches and commits
//! through the GitHub API, fetches the artifacts for a window of commits
//! concurrently, and turns them into one chart per benchmark.
//!
//! # Features
//!
//! - Paginated GitHub listings behind the [`github::HostingDirectory`] trait
//! - Concurrent artifact fan-out with per-commit failure isolation
//! - A selection state machine driven end to end by [`session::Session`]
//! - Static HTML dashboards with Chart.js
//!
//! # Example
//!
//! ```no_run
//! use bench_display::{aggregator::Aggregator, config::Endpoints, github::GitHubClient, store::ObjectStore};
//! use bench_display_core::ViewOptions;
//!
//! # async fn run() -> bench_display::Result<()> {
//! let endpoints = Endpoints::public()?;
//! let github = GitHubClient::new(endpoints.clone())?;
//! let aggregator = Aggregator::new(ObjectStore::new(endpoints)?);
//!
//! let aggregate = aggregator
//!     .query(&github, "PolyhedraZK", "Expander-rs", "main", 30)
//!     .await?;
//! for series in aggregate.charts(&ViewOptions::default()) {
//!     println!("{}: {} points", series.name, series.points.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod config;
pub mod error;
pub mod github;
pub mod html;
pub mod session;
pub mod store;

pub use error::{Error, Result};
