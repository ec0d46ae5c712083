//! Benchmark artifact store: one JSON document per commit in a public bucket

use crate::config::Endpoints;
use crate::error::{Error, Result};
use async_trait::async_trait;
use bench_display_core::{parse_document, BenchmarkDocument};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

/// Outcome of one artifact lookup
#[derive(Debug)]
pub enum ArtifactFetch {
    Found(BenchmarkDocument),
    /// The store answered with a non-success status (e.g. CI not finished)
    NotFound,
    /// The store could not be reached or returned an unreadable body
    Failed(Error),
}

impl From<Result<Option<BenchmarkDocument>>> for ArtifactFetch {
    fn from(result: Result<Option<BenchmarkDocument>>) -> Self {
        match result {
            Ok(Some(document)) => ArtifactFetch::Found(document),
            Ok(None) => ArtifactFetch::NotFound,
            Err(e) => ArtifactFetch::Failed(e),
        }
    }
}

/// Somewhere benchmark artifacts can be looked up by commit
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    async fn fetch_artifact(&self, repo: &str, commit: &str) -> ArtifactFetch;
}

/// HTTP client for the artifact bucket
pub struct ObjectStore {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl ObjectStore {
    pub fn new(endpoints: Endpoints) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("bench-display"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { client, endpoints })
    }

    /// Fetch `{repo}/benchmark_{commit}.json`.
    ///
    /// A non-success status is `Ok(None)`: a missing artifact is expected.
    pub async fn get(&self, repo: &str, commit: &str) -> Result<Option<BenchmarkDocument>> {
        let url = self.endpoints.artifact_url(repo, commit);
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!(%url, %status, "No artifact");
            return Ok(None);
        }

        let body = response.text().await?;
        let document = parse_document(&body)?;
        debug!(%url, benchmarks = document.len(), "Fetched artifact");
        Ok(Some(document))
    }
}

#[async_trait]
impl ArtifactSource for ObjectStore {
    async fn fetch_artifact(&self, repo: &str, commit: &str) -> ArtifactFetch {
        self.get(repo, commit).await.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};
    use serde_json::json;

    fn store_for(server: &Server) -> ObjectStore {
        let base = server.url_str("/github_micro_bench");
        ObjectStore::new(Endpoints::new(&base, &base).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_get_found() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "GET",
                "/github_micro_bench/widgets/benchmark_abc123.json",
            ))
            .respond_with(json_encoded(json!({
                "prove": { "median_time": 0.125, "max_time": 0.2 },
                "verify": { "median_time": 0.002 }
            }))),
        );

        let doc = store_for(&server)
            .get("widgets", "abc123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc["prove"].median_time, Some(0.125));
    }

    #[tokio::test]
    async fn test_bad_record_keeps_the_rest_of_the_artifact() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "GET",
                "/github_micro_bench/widgets/benchmark_abc123.json",
            ))
            .respond_with(json_encoded(json!({
                "fft": { "median_time": 0.5 },
                "broken": { "median_time": "n/a" },
                "version": 2
            }))),
        );

        let fetch = store_for(&server).fetch_artifact("widgets", "abc123").await;
        let doc = match fetch {
            ArtifactFetch::Found(doc) => doc,
            other => panic!("expected a document, got {:?}", other),
        };
        assert_eq!(doc["fft"].median_time, Some(0.5));
        assert_eq!(doc["broken"].median_time, None);
        assert!(!doc.contains_key("version"));
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "GET",
                "/github_micro_bench/widgets/benchmark_abc123.json",
            ))
            .respond_with(status_code(404)),
        );

        let doc = store_for(&server).get("widgets", "abc123").await.unwrap();
        assert!(doc.is_none());
    }

    #[tokio::test]
    async fn test_forbidden_is_none() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "GET",
                "/github_micro_bench/widgets/benchmark_abc123.json",
            ))
            .respond_with(status_code(403)),
        );

        let fetch = store_for(&server).fetch_artifact("widgets", "abc123").await;
        assert!(matches!(fetch, ArtifactFetch::NotFound));
    }

    #[tokio::test]
    async fn test_unreadable_body_fails() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "GET",
                "/github_micro_bench/widgets/benchmark_abc123.json",
            ))
            .respond_with(status_code(200).body("<html>oops</html>")),
        );

        let fetch = store_for(&server).fetch_artifact("widgets", "abc123").await;
        assert!(matches!(fetch, ArtifactFetch::Failed(Error::Core(_))));
    }

    #[tokio::test]
    async fn test_unreachable_store_fails() {
        let endpoints = Endpoints::new("http://127.0.0.1:1", "http://127.0.0.1:1").unwrap();
        let store = ObjectStore::new(endpoints).unwrap();

        assert!(store.get("widgets", "abc123").await.is_err());
        let fetch = store.fetch_artifact("widgets", "abc123").await;
        assert!(matches!(fetch, ArtifactFetch::Failed(Error::Http(_))));
    }
}
