//! Concurrent acquisition of benchmark artifacts for a commit range

use crate::error::Result;
use crate::github::HostingDirectory;
use crate::store::{ArtifactFetch, ArtifactSource};
use bench_display_core::{Aggregate, BenchmarkTable};
use futures::future::join_all;
use tracing::{debug, info, warn};

/// Builds [`Aggregate`]s by fanning out one artifact lookup per commit
pub struct Aggregator<S> {
    source: S,
}

impl<S: ArtifactSource> Aggregator<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch the artifact of every commit concurrently and merge the ones
    /// that exist into a fresh table.
    ///
    /// Lookups are dispatched together and all of them are awaited; a
    /// missing or failed artifact only leaves its own commit out.
    pub async fn aggregate(&self, repo: &str, commits: &[String]) -> Aggregate {
        let lookups = commits.iter().map(|commit| async move {
            let outcome = self.source.fetch_artifact(repo, commit).await;
            (commit, outcome)
        });
        let outcomes = join_all(lookups).await;

        let mut table = BenchmarkTable::new();
        let mut missing = 0;
        let mut failed = 0;
        for (commit, outcome) in outcomes {
            match outcome {
                ArtifactFetch::Found(document) => table.insert(commit.clone(), document),
                ArtifactFetch::NotFound => {
                    debug!("No artifact for {}", commit);
                    missing += 1;
                }
                ArtifactFetch::Failed(e) => {
                    warn!("Artifact fetch for {} failed: {}", commit, e);
                    failed += 1;
                }
            }
        }

        info!(
            "Collected {} of {} artifacts for {} ({} missing, {} failed)",
            table.len(),
            commits.len(),
            repo,
            missing,
            failed
        );

        Aggregate::new(repo, commits.to_vec(), table)
    }

    /// Resolve the `window` most recent commits ending at `commit` and
    /// aggregate their artifacts.
    ///
    /// Fails only when the commit range itself cannot be listed.
    pub async fn query<H>(
        &self,
        hosting: &H,
        owner: &str,
        repo: &str,
        commit: &str,
        window: usize,
    ) -> Result<Aggregate>
    where
        H: HostingDirectory + ?Sized,
    {
        let range = hosting.commit_window(owner, repo, commit, window).await?;
        let ids: Vec<String> = range.into_iter().map(|c| c.id).collect();
        Ok(self.aggregate(repo, &ids).await)
    }
}
