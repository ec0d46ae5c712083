//! Reshaping a benchmark table into per-benchmark chart series

use crate::data::{short_id, BenchmarkTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Left-to-right direction of the commits in a chart
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Chronology {
    /// Oldest commit on the left
    #[default]
    OldestFirst,
    /// Newest commit on the left, i.e. history order
    NewestFirst,
}

/// Which end of the commit range decides the charted benchmark names
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceCommit {
    /// The selected commit (head of the range)
    #[default]
    Newest,
    /// The oldest commit of the range
    Oldest,
}

/// How the set of charted benchmark names is derived
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum NameSelection {
    /// Only the names present in the reference commit's artifact
    #[default]
    Reference,
    /// Every name seen in any artifact of the range
    Union,
}

/// Presentation choices for an aggregate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ViewOptions {
    pub chronology: Chronology,
    pub reference: ReferenceCommit,
    pub names: NameSelection,
}

/// One point of a chart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartPoint {
    /// Full commit identifier (tooltip)
    pub commit: String,
    /// Truncated identifier (axis label)
    pub label: String,
    /// Median time in seconds
    pub value: f64,
}

/// Chronological measurements of one benchmark
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartSeries {
    pub name: String,
    pub chronology: Chronology,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    /// The point of the most recent commit that has a measurement
    pub fn newest(&self) -> Option<&ChartPoint> {
        match self.chronology {
            Chronology::OldestFirst => self.points.last(),
            Chronology::NewestFirst => self.points.first(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Why an aggregate has nothing to chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    /// No commit of the range has an artifact
    NoData,
    /// Some artifacts exist but the reference commit has none (or it is empty)
    NoReferenceData,
}

impl EmptyState {
    pub fn message(&self) -> &'static str {
        match self {
            EmptyState::NoData => "No benchmark data available. The CI might still be running.",
            EmptyState::NoReferenceData => {
                "No benchmark data for this commit, maybe CI is still running."
            }
        }
    }
}

/// Result of one benchmark query: the commit range in history order
/// (newest first) and the artifacts that could be fetched for it.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Aggregate {
    pub repository: String,
    pub commits: Vec<String>,
    pub table: BenchmarkTable,
}

impl Aggregate {
    pub fn new(repository: impl Into<String>, commits: Vec<String>, table: BenchmarkTable) -> Self {
        Self {
            repository: repository.into(),
            commits,
            table,
        }
    }

    /// Commits in the requested left-to-right order
    pub fn ordered_commits(&self, chronology: Chronology) -> Vec<&str> {
        let iter = self.commits.iter().map(String::as_str);
        match chronology {
            Chronology::NewestFirst => iter.collect(),
            Chronology::OldestFirst => iter.rev().collect(),
        }
    }

    /// The commit whose artifact decides which benchmarks are charted
    pub fn reference_commit(&self, reference: ReferenceCommit) -> Option<&str> {
        let commit = match reference {
            ReferenceCommit::Newest => self.commits.first(),
            ReferenceCommit::Oldest => self.commits.last(),
        };
        commit.map(String::as_str)
    }

    /// Names of the benchmarks to chart, in lexical order
    pub fn benchmark_names(&self, options: &ViewOptions) -> Vec<String> {
        match options.names {
            NameSelection::Reference => self
                .reference_commit(options.reference)
                .and_then(|commit| self.table.get(commit))
                .map(|doc| doc.keys().cloned().collect())
                .unwrap_or_default(),
            NameSelection::Union => self
                .commits
                .iter()
                .filter_map(|commit| self.table.get(commit))
                .flat_map(|doc| doc.keys().cloned())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        }
    }

    /// Series of one benchmark across the range.
    ///
    /// Commits without a measurement are skipped rather than zero-filled.
    pub fn series_for(&self, name: &str, chronology: Chronology) -> ChartSeries {
        let points = self
            .ordered_commits(chronology)
            .into_iter()
            .filter_map(|commit| {
                self.table.median_time(commit, name).map(|value| ChartPoint {
                    commit: commit.to_string(),
                    label: short_id(commit).to_string(),
                    value,
                })
            })
            .collect();

        ChartSeries {
            name: name.to_string(),
            chronology,
            points,
        }
    }

    /// One series per charted benchmark
    pub fn charts(&self, options: &ViewOptions) -> Vec<ChartSeries> {
        self.benchmark_names(options)
            .iter()
            .map(|name| self.series_for(name, options.chronology))
            .collect()
    }

    /// `Some` when there is nothing to chart
    pub fn empty_state(&self, options: &ViewOptions) -> Option<EmptyState> {
        if self.table.is_empty() {
            Some(EmptyState::NoData)
        } else if self.benchmark_names(options).is_empty() {
            Some(EmptyState::NoReferenceData)
        } else {
            None
        }
    }
}
