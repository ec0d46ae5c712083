//! Drives the dashboard state machine against live data sources

use crate::aggregator::Aggregator;
use crate::error::{Error, Result};
use crate::github::HostingDirectory;
use crate::store::ArtifactSource;
use bench_display_core::{Dashboard, Effect, Event, Generation, Stage};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Explicit choices applied on top of the default selection cascade
#[derive(Debug, Clone, Default)]
pub struct Picks {
    pub repo: Option<String>,
    pub branch: Option<String>,
    pub commit: Option<String>,
}

/// A dashboard plus the clients that serve its requests
pub struct Session<H, S> {
    hosting: H,
    aggregator: Aggregator<S>,
    dashboard: Dashboard,
    window: usize,
}

impl<H, S> Session<H, S>
where
    H: HostingDirectory,
    S: ArtifactSource,
{
    pub fn new(hosting: H, store: S, dashboard: Dashboard, window: usize) -> Self {
        Self {
            hosting,
            aggregator: Aggregator::new(store),
            dashboard,
            window,
        }
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn dashboard_mut(&mut self) -> &mut Dashboard {
        &mut self.dashboard
    }

    /// Apply `event` and keep running the resulting effects until the
    /// dashboard settles. Returns the number of effects executed.
    pub async fn dispatch(&mut self, event: Event) -> usize {
        let mut queue = VecDeque::from([event]);
        let mut executed = 0;

        while let Some(event) = queue.pop_front() {
            for effect in self.dashboard.handle(event) {
                let outcome = self.run_effect(effect).await;
                queue.push_back(outcome);
                executed += 1;
            }
        }

        debug!(
            "Dashboard settled in {:?} after {} requests",
            self.dashboard.phase(),
            executed
        );
        executed
    }

    /// Confirm `owner`, apply `picks` and submit the benchmark query.
    ///
    /// Stops at the first stage that fails, so a fetch failure is never
    /// masked by the incomplete-form message a later submit would raise.
    pub async fn load(&mut self, owner: &str, picks: Picks) -> Result<()> {
        self.dispatch(Event::ConfirmOwner(owner.to_string())).await;
        self.settled()?;

        // The cascade may already have picked the wanted repo
        if let Some(repo) = picks.repo {
            if self.dashboard.selection().repo.as_deref() != Some(repo.as_str()) {
                self.dispatch(Event::SelectRepo(repo)).await;
                self.settled()?;
            }
        }
        if let Some(branch) = picks.branch {
            self.dispatch(Event::SelectBranch(branch)).await;
            self.settled()?;
        }
        if let Some(commit) = picks.commit {
            self.dispatch(Event::SelectCommit(commit)).await;
            self.settled()?;
        }

        self.dispatch(Event::Submit).await;
        self.settled()
    }

    /// The error banner of a failed stage, else the form validation message
    pub fn settled(&self) -> Result<()> {
        if let Some(message) = self.dashboard.error() {
            return Err(Error::StageFailed(message.to_string()));
        }
        if let Some(message) = self.dashboard.validation() {
            return Err(bench_display_core::Error::Validation(message.to_string()).into());
        }
        Ok(())
    }

    /// Perform one effect and translate its outcome into an event
    pub async fn run_effect(&self, effect: Effect) -> Event {
        let stage = effect.stage();
        info!("Fetching {} ({})", stage, effect.generation());

        match effect {
            Effect::FetchRepos { generation, owner } => {
                match self.hosting.list_repositories(&owner).await {
                    Ok(repos) => Event::ReposLoaded { generation, repos },
                    Err(e) => failed(generation, stage, e),
                }
            }
            Effect::FetchBranches {
                generation,
                owner,
                repo,
            } => match self.hosting.list_branches(&owner, &repo).await {
                Ok(branches) => Event::BranchesLoaded {
                    generation,
                    branches,
                },
                Err(e) => failed(generation, stage, e),
            },
            Effect::FetchCommits {
                generation,
                owner,
                repo,
                branch,
            } => match self.hosting.list_commits(&owner, &repo, &branch).await {
                Ok(commits) => Event::CommitsLoaded {
                    generation,
                    commits,
                },
                Err(e) => failed(generation, stage, e),
            },
            Effect::FetchBenchmarks {
                generation,
                owner,
                repo,
                commit,
            } => match self
                .aggregator
                .query(&self.hosting, &owner, &repo, &commit, self.window)
                .await
            {
                Ok(aggregate) => Event::BenchmarksLoaded {
                    generation,
                    aggregate,
                },
                Err(e) => failed(generation, stage, e),
            },
        }
    }
}

fn failed(generation: Generation, stage: Stage, error: Error) -> Event {
    warn!("Fetching {} failed: {}", stage, error);
    let message = match error {
        Error::FetchFailure { resource, reason } if resource == stage.to_string() => reason,
        Error::FetchFailure { resource, reason } => format!("{}: {}", resource, reason),
        other => other.to_string(),
    };
    Event::StageFailed {
        generation,
        stage,
        message,
    }
}
