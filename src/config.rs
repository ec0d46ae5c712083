//! Endpoint and query configuration

use crate::error::{Error, Result};
use bench_display_core::ViewOptions;
use url::Url;

/// Public GitHub REST API
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Public bucket holding `{repo}/benchmark_{commit}.json` artifacts
pub const DEFAULT_STORAGE_BASE: &str = "https://storage.googleapis.com/github_micro_bench";

pub const DEFAULT_OWNER: &str = "PolyhedraZK";
pub const DEFAULT_REPO: &str = "Expander-rs";

/// Number of ancestor commits charted for a selected commit
pub const DEFAULT_WINDOW: usize = 30;

/// Base locations of the two read-only data sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    api_base: Url,
    storage_base: Url,
}

impl Endpoints {
    pub fn new(api_base: &str, storage_base: &str) -> Result<Self> {
        Ok(Self {
            api_base: parse_base(api_base)?,
            storage_base: parse_base(storage_base)?,
        })
    }

    /// GitHub and the public benchmark bucket
    pub fn public() -> Result<Self> {
        Self::new(DEFAULT_API_BASE, DEFAULT_STORAGE_BASE)
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    pub fn storage_base(&self) -> &Url {
        &self.storage_base
    }

    /// Absolute URL of an API path given as segments, e.g.
    /// `["users", "acme", "repos"]`. Segments are percent-encoded.
    pub fn api_url(&self, segments: &[&str]) -> Url {
        join(&self.api_base, segments)
    }

    /// Absolute URL of a commit's benchmark artifact
    pub fn artifact_url(&self, repo: &str, commit: &str) -> Url {
        join(
            &self.storage_base,
            &[repo, &format!("benchmark_{}.json", commit)],
        )
    }
}

fn parse_base(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())?;
    match url.scheme() {
        "http" | "https" if !url.cannot_be_a_base() => Ok(url),
        other => Err(Error::Config(format!(
            "Unsupported scheme '{}' in base URL {}",
            other, raw
        ))),
    }
}

fn join(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    // http(s) bases always have a path
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Parameters of a benchmark query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// How many commits, counting back from the selected one, to chart
    pub window: usize,
    pub view: ViewOptions,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            view: ViewOptions::default(),
        }
    }
}
