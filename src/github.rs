//! GitHub API integration: repository, branch and commit listings

use crate::config::Endpoints;
use crate::error::{Error, Result};
use async_trait::async_trait;
use bench_display_core::{Branch, Commit, Repository};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use tracing::{debug, info};

/// Items requested per page of a paginated listing
pub const PAGE_SIZE: usize = 100;

/// Read-only view of a source-control hosting service
#[async_trait]
pub trait HostingDirectory: Send + Sync {
    /// Every repository owned by `owner`
    async fn list_repositories(&self, owner: &str) -> Result<Vec<Repository>>;

    /// Branches of a repository (first page only)
    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<Branch>>;

    /// Every commit reachable from `reference`, newest first
    async fn list_commits(&self, owner: &str, repo: &str, reference: &str) -> Result<Vec<Commit>>;

    /// The most recent commit on `reference`, if it has any
    async fn latest_commit(&self, owner: &str, repo: &str, reference: &str)
        -> Result<Option<Commit>>;

    /// Up to `limit` commits ending at `commit`, newest first
    async fn commit_window(
        &self,
        owner: &str,
        repo: &str,
        commit: &str,
        limit: usize,
    ) -> Result<Vec<Commit>>;
}

/// GitHub API client
pub struct GitHubClient {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl GitHubClient {
    pub fn new(endpoints: Endpoints) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("bench-display"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { client, endpoints })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.endpoints.api_url(segments);
        debug!(%url, ?query, "GET {}", resource);

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::fetch(resource, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(resource, format!("HTTP {}", status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::fetch(resource, e))
    }

    async fn commits_page(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
        per_page: usize,
        page: usize,
    ) -> Result<Vec<Commit>> {
        let path = ["repos", owner, repo, "commits"];
        let query = [
            ("sha", reference.to_string()),
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
        ];
        let commits: Vec<GitHubCommit> = self.get_json("commits", &path, &query).await?;
        Ok(commits.into_iter().map(Commit::from).collect())
    }
}

#[async_trait]
impl HostingDirectory for GitHubClient {
    async fn list_repositories(&self, owner: &str) -> Result<Vec<Repository>> {
        let path = ["users", owner, "repos"];
        let repos: Vec<GitHubRepo> = fetch_all_pages("repositories", |page| {
            let query = [
                ("per_page", PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ];
            let path = &path;
            async move { self.get_json("repositories", path.as_slice(), &query).await }
        })
        .await?;

        info!("Found {} repositories for {}", repos.len(), owner);
        Ok(repos
            .into_iter()
            .map(|r| Repository {
                name: r.name,
                owner: owner.to_string(),
            })
            .collect())
    }

    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<Branch>> {
        let path = ["repos", owner, repo, "branches"];
        let branches: Vec<GitHubBranch> = self.get_json("branches", &path, &[]).await?;

        info!("Found {} branches in {}/{}", branches.len(), owner, repo);
        Ok(branches
            .into_iter()
            .map(|b| Branch {
                name: b.name,
                repository: repo.to_string(),
            })
            .collect())
    }

    async fn list_commits(&self, owner: &str, repo: &str, reference: &str) -> Result<Vec<Commit>> {
        let commits = fetch_all_pages("commits", |page| {
            self.commits_page(owner, repo, reference, PAGE_SIZE, page)
        })
        .await?;

        info!(
            "Found {} commits reachable from {} in {}/{}",
            commits.len(),
            reference,
            owner,
            repo
        );
        Ok(commits)
    }

    async fn latest_commit(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
    ) -> Result<Option<Commit>> {
        let mut commits = self.commits_page(owner, repo, reference, 1, 1).await?;
        Ok(if commits.is_empty() {
            None
        } else {
            Some(commits.swap_remove(0))
        })
    }

    async fn commit_window(
        &self,
        owner: &str,
        repo: &str,
        commit: &str,
        limit: usize,
    ) -> Result<Vec<Commit>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let per_page = limit.min(PAGE_SIZE);
        let mut commits = Vec::with_capacity(limit);
        let mut page = 1;
        while commits.len() < limit {
            let batch = self.commits_page(owner, repo, commit, per_page, page).await?;
            let short = batch.len() < per_page;
            commits.extend(batch);
            if short {
                break;
            }
            page += 1;
        }
        commits.truncate(limit);

        debug!("Resolved {} commits ending at {}", commits.len(), commit);
        Ok(commits)
    }
}

/// Request pages 1, 2, ... until one comes back with fewer than
/// [`PAGE_SIZE`] items, and concatenate them in order.
///
/// Any failing page fails the whole listing.
pub async fn fetch_all_pages<T, F, Fut>(resource: &str, mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut items = Vec::new();
    let mut page = 1;

    loop {
        let batch = fetch_page(page).await?;
        let full = batch.len() == PAGE_SIZE;
        debug!("Fetched page {} of {} ({} items)", page, resource, batch.len());
        items.extend(batch);

        if !full {
            break;
        }
        page += 1;
    }

    Ok(items)
}

// GitHub API response types

#[derive(Debug, Deserialize)]
struct GitHubRepo {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GitHubBranch {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GitHubCommit {
    sha: String,
    commit: GitHubCommitData,
    #[serde(default)]
    html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitData {
    message: String,
    #[serde(default)]
    author: Option<GitHubAuthor>,
}

#[derive(Debug, Deserialize)]
struct GitHubAuthor {
    #[serde(default)]
    date: Option<DateTime<Utc>>,
}

impl From<GitHubCommit> for Commit {
    fn from(response: GitHubCommit) -> Self {
        let mut commit = Commit::new(response.sha, &response.commit.message);
        commit.timestamp = response.commit.author.and_then(|a| a.date);
        commit.url = response.html_url;
        commit
    }
}

/// Parse a GitHub repository URL or string into owner and repo
pub fn parse_repo_slug(repo: &str) -> Result<(String, String)> {
    // Handle various formats:
    // - owner/repo
    // - https://github.com/owner/repo
    // - git@github.com:owner/repo.git
    // - github.com/owner/repo

    let repo = repo.trim();
    let repo = repo.strip_suffix(".git").unwrap_or(repo);

    let split = |path: &str| -> Option<(String, String)> {
        let mut parts = path.trim_matches('/').split('/');
        match (parts.next(), parts.next()) {
            (Some(owner), Some(name)) if !owner.is_empty() && !name.is_empty() => {
                Some((owner.to_string(), name.to_string()))
            }
            _ => None,
        }
    };

    let parsed = if let Some(path) = repo.strip_prefix("git@github.com:") {
        split(path)
    } else if let Some(path) = repo.strip_prefix("github.com/") {
        split(path)
    } else if repo.contains("://") {
        url::Url::parse(repo).ok().and_then(|url| split(url.path()))
    } else if repo.matches('/').count() == 1 {
        split(repo)
    } else {
        None
    };

    parsed.ok_or_else(|| {
        Error::Config(format!(
            "Could not parse GitHub repository from: {}",
            repo
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{all_of, matchers::*, responders::*, Expectation, Server};
    use serde_json::{json, Value};

    fn client_for(server: &Server) -> GitHubClient {
        let base = server.url_str("");
        GitHubClient::new(Endpoints::new(&base, &base).unwrap()).unwrap()
    }

    fn repos_page(start: usize, count: usize) -> Value {
        Value::Array(
            (start..start + count)
                .map(|i| json!({ "name": format!("repo-{}", i), "private": false }))
                .collect(),
        )
    }

    fn commits_page(start: usize, count: usize) -> Value {
        Value::Array(
            (start..start + count)
                .map(|i| {
                    json!({
                        "sha": format!("{:040x}", i),
                        "html_url": format!("https://github.com/acme/widgets/commit/{:040x}", i),
                        "commit": {
                            "message": format!("Commit {}\n\nDetails", i),
                            "author": { "name": "dev", "date": "2024-05-01T12:00:00Z" }
                        }
                    })
                })
                .collect(),
        )
    }

    fn expect_repos_page(server: &Server, page: &'static str, body: Value) {
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/users/acme/repos"),
                request::query(url_decoded(contains(("per_page", "100")))),
                request::query(url_decoded(contains(("page", page)))),
            ])
            .times(1)
            .respond_with(json_encoded(body)),
        );
    }

    #[tokio::test]
    async fn test_list_repositories_paginates_until_short_page() {
        let server = Server::run();
        expect_repos_page(&server, "1", repos_page(0, 100));
        expect_repos_page(&server, "2", repos_page(100, 100));
        expect_repos_page(&server, "3", repos_page(200, 37));

        let repos = client_for(&server).list_repositories("acme").await.unwrap();

        assert_eq!(repos.len(), 237);
        assert_eq!(repos[0].name, "repo-0");
        assert_eq!(repos[100].name, "repo-100");
        assert_eq!(repos[236].name, "repo-236");
        assert!(repos.iter().all(|r| r.owner == "acme"));
    }

    #[tokio::test]
    async fn test_list_repositories_empty_first_page() {
        let server = Server::run();
        expect_repos_page(&server, "1", json!([]));

        let repos = client_for(&server).list_repositories("acme").await.unwrap();
        assert!(repos.is_empty());
    }

    #[tokio::test]
    async fn test_list_repositories_failure_discards_pages() {
        let server = Server::run();
        expect_repos_page(&server, "1", repos_page(0, 100));
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/users/acme/repos"),
                request::query(url_decoded(contains(("page", "2")))),
            ])
            .times(1)
            .respond_with(status_code(403)),
        );

        let err = client_for(&server)
            .list_repositories("acme")
            .await
            .unwrap_err();

        match err {
            Error::FetchFailure { resource, reason } => {
                assert_eq!(resource, "repositories");
                assert!(reason.contains("403"), "{}", reason);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_commits_paginates_in_server_order() {
        let server = Server::run();
        for (page, start, count) in [("1", 0, 100), ("2", 100, 100), ("3", 200, 37)] {
            server.expect(
                Expectation::matching(all_of![
                    request::method_path("GET", "/repos/acme/widgets/commits"),
                    request::query(url_decoded(contains(("sha", "main")))),
                    request::query(url_decoded(contains(("per_page", "100")))),
                    request::query(url_decoded(contains(("page", page)))),
                ])
                .times(1)
                .respond_with(json_encoded(commits_page(start, count))),
            );
        }

        let commits = client_for(&server)
            .list_commits("acme", "widgets", "main")
            .await
            .unwrap();

        assert_eq!(commits.len(), 237);
        assert_eq!(commits[0].id, format!("{:040x}", 0));
        assert_eq!(commits[236].id, format!("{:040x}", 236));
        assert_eq!(commits[5].summary, "Commit 5");
        assert!(commits[0].timestamp.is_some());
        assert!(commits[0].url.as_deref().unwrap().ends_with(&commits[0].id));
    }

    #[tokio::test]
    async fn test_list_branches_single_request() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/repos/acme/widgets/branches"))
                .times(1)
                .respond_with(json_encoded(json!([
                    { "name": "dev", "protected": false },
                    { "name": "main", "protected": true }
                ]))),
        );

        let branches = client_for(&server)
            .list_branches("acme", "widgets")
            .await
            .unwrap();

        let names: Vec<_> = branches.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["dev", "main"]);
        assert_eq!(branches[0].repository, "widgets");
    }

    #[tokio::test]
    async fn test_path_input_is_percent_encoded() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/repos/acme/we%23ird%3F/branches"))
                .times(1)
                .respond_with(json_encoded(json!([{ "name": "main" }]))),
        );

        let branches = client_for(&server)
            .list_branches("acme", "we#ird?")
            .await
            .unwrap();
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].repository, "we#ird?");
    }

    #[tokio::test]
    async fn test_list_branches_not_found() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/repos/acme/nope/branches"))
                .respond_with(status_code(404)),
        );

        let err = client_for(&server)
            .list_branches("acme", "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FetchFailure { ref resource, .. } if resource == "branches"));
    }

    #[tokio::test]
    async fn test_latest_commit() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/repos/acme/widgets/commits"),
                request::query(url_decoded(contains(("sha", "dev")))),
                request::query(url_decoded(contains(("per_page", "1")))),
                request::query(url_decoded(contains(("page", "1")))),
            ])
            .respond_with(json_encoded(commits_page(7, 1))),
        );

        let latest = client_for(&server)
            .latest_commit("acme", "widgets", "dev")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.id, format!("{:040x}", 7));
    }

    #[tokio::test]
    async fn test_commit_window_single_page() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/repos/acme/widgets/commits"),
                request::query(url_decoded(contains(("sha", "abc")))),
                request::query(url_decoded(contains(("per_page", "30")))),
            ])
            .times(1)
            .respond_with(json_encoded(commits_page(0, 30))),
        );

        let window = client_for(&server)
            .commit_window("acme", "widgets", "abc", 30)
            .await
            .unwrap();
        assert_eq!(window.len(), 30);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_fetch_failure() {
        let endpoints = Endpoints::new("http://127.0.0.1:1", "http://127.0.0.1:1").unwrap();
        let client = GitHubClient::new(endpoints).unwrap();

        let err = client.list_branches("acme", "widgets").await.unwrap_err();
        assert!(matches!(err, Error::FetchFailure { .. }));
    }

    #[test]
    fn test_parse_repo_slug_simple() {
        let (owner, repo) = parse_repo_slug("owner/repo").unwrap();
        assert_eq!(owner, "owner");
        assert_eq!(repo, "repo");
    }

    #[test]
    fn test_parse_repo_slug_https() {
        let (owner, repo) = parse_repo_slug("https://github.com/owner/repo.git").unwrap();
        assert_eq!(owner, "owner");
        assert_eq!(repo, "repo");
    }

    #[test]
    fn test_parse_repo_slug_ssh() {
        let (owner, repo) = parse_repo_slug("git@github.com:owner/repo.git").unwrap();
        assert_eq!(owner, "owner");
        assert_eq!(repo, "repo");
    }

    #[test]
    fn test_parse_repo_slug_bare_domain() {
        let (owner, repo) = parse_repo_slug("github.com/owner/repo").unwrap();
        assert_eq!(owner, "owner");
        assert_eq!(repo, "repo");
    }

    #[test]
    fn test_parse_repo_slug_invalid() {
        assert!(parse_repo_slug("just-a-name").is_err());
        assert!(parse_repo_slug("a/b/c").is_err());
        assert!(parse_repo_slug("/repo").is_err());
    }
}
