//! Dashboard selection state machine
//!
//! The dashboard walks owner -> repository -> branch -> commit, each step
//! gated on data loaded by the previous one, then submits a benchmark query.
//! [`Dashboard::handle`] applies an [`Event`] and returns the [`Effect`]s the
//! host must run; the host feeds their outcome back as further events.
//!
//! Every effect carries the [`Generation`] it was issued under. A new user
//! action bumps the generation, so results of superseded requests are
//! dropped when they arrive late.

use crate::aggregate::{Aggregate, ChartSeries, EmptyState, ViewOptions};
use crate::data::{Branch, Commit, Repository};
use crate::error::{Error, Result};
use std::fmt;

/// Query generation token
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    OwnerConfirmed,
    RepoSelected,
    BranchSelected,
    CommitSelected,
    Loading,
    Loaded,
    Failed,
}

/// Pipeline stage a request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Repositories,
    Branches,
    Commits,
    Benchmarks,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Repositories => "repositories",
            Stage::Branches => "branches",
            Stage::Commits => "commits",
            Stage::Benchmarks => "benchmarks",
        };
        f.write_str(name)
    }
}

/// Inputs to the state machine: user actions and fetch outcomes
#[derive(Debug, Clone)]
pub enum Event {
    ConfirmOwner(String),
    ReposLoaded {
        generation: Generation,
        repos: Vec<Repository>,
    },
    SelectRepo(String),
    BranchesLoaded {
        generation: Generation,
        branches: Vec<Branch>,
    },
    SelectBranch(String),
    CommitsLoaded {
        generation: Generation,
        commits: Vec<Commit>,
    },
    SelectCommit(String),
    Submit,
    BenchmarksLoaded {
        generation: Generation,
        aggregate: Aggregate,
    },
    StageFailed {
        generation: Generation,
        stage: Stage,
        message: String,
    },
}

/// Requests the host must perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchRepos {
        generation: Generation,
        owner: String,
    },
    FetchBranches {
        generation: Generation,
        owner: String,
        repo: String,
    },
    FetchCommits {
        generation: Generation,
        owner: String,
        repo: String,
        branch: String,
    },
    FetchBenchmarks {
        generation: Generation,
        owner: String,
        repo: String,
        commit: String,
    },
}

impl Effect {
    pub fn generation(&self) -> Generation {
        match self {
            Effect::FetchRepos { generation, .. }
            | Effect::FetchBranches { generation, .. }
            | Effect::FetchCommits { generation, .. }
            | Effect::FetchBenchmarks { generation, .. } => *generation,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Effect::FetchRepos { .. } => Stage::Repositories,
            Effect::FetchBranches { .. } => Stage::Branches,
            Effect::FetchCommits { .. } => Stage::Commits,
            Effect::FetchBenchmarks { .. } => Stage::Benchmarks,
        }
    }
}

/// Current user selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub branch: Option<String>,
    pub commit: Option<String>,
}

impl Selection {
    /// All four fields, or a validation error if any is missing
    pub fn complete(&self) -> Result<(&str, &str, &str, &str)> {
        match (&self.owner, &self.repo, &self.branch, &self.commit) {
            (Some(owner), Some(repo), Some(branch), Some(commit)) => {
                Ok((owner, repo, branch, commit))
            }
            _ => Err(Error::Validation("Please fill in all fields".to_string())),
        }
    }
}

/// The dashboard shell's state
#[derive(Debug, Clone)]
pub struct Dashboard {
    phase: Phase,
    generation: Generation,
    pending: Option<Stage>,
    selection: Selection,
    default_repo: Option<String>,
    repos: Vec<Repository>,
    branches: Vec<Branch>,
    commits: Vec<Commit>,
    aggregate: Option<Aggregate>,
    error: Option<String>,
    validation: Option<String>,
    options: ViewOptions,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            generation: Generation::default(),
            pending: None,
            selection: Selection::default(),
            default_repo: None,
            repos: Vec::new(),
            branches: Vec::new(),
            commits: Vec::new(),
            aggregate: None,
            error: None,
            validation: None,
            options: ViewOptions::default(),
        }
    }

    /// Repository to pick once an owner's repositories are known
    pub fn with_default_repo(mut self, repo: impl Into<String>) -> Self {
        self.default_repo = Some(repo.into());
        self
    }

    pub fn with_options(mut self, options: ViewOptions) -> Self {
        self.options = options;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn repos(&self) -> &[Repository] {
        &self.repos
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    pub fn aggregate(&self) -> Option<&Aggregate> {
        self.aggregate.as_ref()
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    /// True while any stage has a request in flight
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<Stage> {
        self.pending
    }

    /// Error banner text of the last failed stage
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Form-level validation message
    pub fn validation(&self) -> Option<&str> {
        self.validation.as_deref()
    }

    /// Informational message when a loaded query has nothing to chart
    pub fn notice(&self) -> Option<&'static str> {
        if self.phase != Phase::Loaded {
            return None;
        }
        self.aggregate
            .as_ref()
            .and_then(|agg| agg.empty_state(&self.options))
            .map(|state| state.message())
    }

    /// Chart series of the loaded query
    pub fn charts(&self) -> Vec<ChartSeries> {
        match (&self.phase, &self.aggregate) {
            (Phase::Loaded, Some(agg)) => agg.charts(&self.options),
            _ => Vec::new(),
        }
    }

    /// Empty state of the loaded query, if any
    pub fn empty_state(&self) -> Option<EmptyState> {
        self.aggregate
            .as_ref()
            .and_then(|agg| agg.empty_state(&self.options))
    }

    /// Apply an event and return the effects to run
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::ConfirmOwner(owner) => self.confirm_owner(owner),
            Event::ReposLoaded { generation, repos } => {
                if !self.accepts(generation) {
                    return Vec::new();
                }
                self.pending = None;
                self.repos = repos;
                match self.pick_default_repo() {
                    Some(repo) => self.select_repo(repo),
                    None => Vec::new(),
                }
            }
            Event::SelectRepo(repo) => self.select_repo(repo),
            Event::BranchesLoaded {
                generation,
                branches,
            } => {
                if !self.accepts(generation) {
                    return Vec::new();
                }
                self.pending = None;
                self.branches = branches;
                match preferred_branch(&self.branches) {
                    Some(branch) => self.select_branch(branch),
                    None => Vec::new(),
                }
            }
            Event::SelectBranch(branch) => self.select_branch(branch),
            Event::CommitsLoaded {
                generation,
                commits,
            } => {
                if !self.accepts(generation) {
                    return Vec::new();
                }
                self.pending = None;
                self.commits = commits;
                match self.commits.first().map(|c| c.id.clone()) {
                    Some(newest) => self.select_commit(newest),
                    None => Vec::new(),
                }
            }
            Event::SelectCommit(commit) => self.select_commit(commit),
            Event::Submit => self.submit(),
            Event::BenchmarksLoaded {
                generation,
                aggregate,
            } => {
                if !self.accepts(generation) {
                    return Vec::new();
                }
                self.pending = None;
                self.aggregate = Some(aggregate);
                self.phase = Phase::Loaded;
                Vec::new()
            }
            Event::StageFailed {
                generation,
                stage,
                message,
            } => {
                if !self.accepts(generation) {
                    return Vec::new();
                }
                self.pending = None;
                self.phase = Phase::Failed;
                self.error = Some(format!("Failed to fetch {}: {}", stage, message));
                Vec::new()
            }
        }
    }

    fn accepts(&self, generation: Generation) -> bool {
        generation == self.generation
    }

    fn bump(&mut self) -> Generation {
        self.generation = self.generation.next();
        self.error = None;
        self.validation = None;
        self.generation
    }

    fn confirm_owner(&mut self, owner: String) -> Vec<Effect> {
        let owner = owner.trim().to_string();
        if owner.is_empty() {
            self.validation = Some("Please enter a repository owner".to_string());
            return Vec::new();
        }

        let generation = self.bump();
        self.selection = Selection {
            owner: Some(owner.clone()),
            ..Default::default()
        };
        self.repos.clear();
        self.branches.clear();
        self.commits.clear();
        self.aggregate = None;
        self.phase = Phase::OwnerConfirmed;
        self.pending = Some(Stage::Repositories);
        vec![Effect::FetchRepos { generation, owner }]
    }

    fn select_repo(&mut self, repo: String) -> Vec<Effect> {
        let Some(owner) = self.selection.owner.clone() else {
            self.validation = Some("Please enter a repository owner".to_string());
            return Vec::new();
        };

        let generation = self.bump();
        self.selection.repo = Some(repo.clone());
        self.selection.branch = None;
        self.selection.commit = None;
        self.branches.clear();
        self.commits.clear();
        self.aggregate = None;
        self.phase = Phase::RepoSelected;
        self.pending = Some(Stage::Branches);
        vec![Effect::FetchBranches {
            generation,
            owner,
            repo,
        }]
    }

    fn select_branch(&mut self, branch: String) -> Vec<Effect> {
        let (Some(owner), Some(repo)) = (self.selection.owner.clone(), self.selection.repo.clone())
        else {
            self.validation = Some("Please select a repository".to_string());
            return Vec::new();
        };

        let generation = self.bump();
        self.selection.branch = Some(branch.clone());
        self.selection.commit = None;
        self.commits.clear();
        self.aggregate = None;
        self.phase = Phase::BranchSelected;
        self.pending = Some(Stage::Commits);
        vec![Effect::FetchCommits {
            generation,
            owner,
            repo,
            branch,
        }]
    }

    fn select_commit(&mut self, commit: String) -> Vec<Effect> {
        if self.selection.branch.is_none() {
            self.validation = Some("Please select a branch".to_string());
            return Vec::new();
        }

        // Invalidates an in-flight benchmark query for the previous commit
        self.bump();
        self.selection.commit = Some(commit);
        self.aggregate = None;
        self.pending = None;
        self.phase = Phase::CommitSelected;
        Vec::new()
    }

    fn submit(&mut self) -> Vec<Effect> {
        let (owner, repo, commit) = match self.selection.complete() {
            Ok((owner, repo, _, commit)) => (owner.to_string(), repo.to_string(), commit.to_string()),
            Err(e) => {
                self.validation = Some(e.to_string());
                return Vec::new();
            }
        };

        let generation = self.bump();
        self.aggregate = None;
        self.phase = Phase::Loading;
        self.pending = Some(Stage::Benchmarks);
        vec![Effect::FetchBenchmarks {
            generation,
            owner,
            repo,
            commit,
        }]
    }

    fn pick_default_repo(&self) -> Option<String> {
        self.default_repo
            .as_ref()
            .filter(|name| self.repos.iter().any(|r| &r.name == *name))
            .cloned()
            .or_else(|| self.repos.first().map(|r| r.name.clone()))
    }
}

/// `main`, then `master`, then whatever comes first
fn preferred_branch(branches: &[Branch]) -> Option<String> {
    ["main", "master"]
        .iter()
        .find_map(|wanted| branches.iter().find(|b| b.name == *wanted))
        .or_else(|| branches.first())
        .map(|b| b.name.clone())
}
