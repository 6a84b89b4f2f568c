//! Content Loader - one fetch attempt, degrade to static markup on failure

use async_trait::async_trait;
use std::path::PathBuf;

use crate::content::ContentDocument;
use crate::error::{SiteError, SiteResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    Default,
    /// Bypass every cache layer so edits show up on the next load.
    NoStore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub cache: CacheMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network capability used by the loader.
#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, request: FetchRequest) -> SiteResult<FetchResponse>;
}

/// Serves content from a directory on disk; missing files map to 404.
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Fetcher for FileFetcher {
    async fn fetch(&self, request: FetchRequest) -> SiteResult<FetchResponse> {
        let path = self.root.join(request.url.trim_start_matches('/'));
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Ok(FetchResponse { status: 200, body }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FetchResponse {
                status: 404,
                body: String::new(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

pub struct ContentLoader<F> {
    fetcher: F,
    content_url: String,
}

impl<F: Fetcher> ContentLoader<F> {
    pub fn new(fetcher: F, content_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            content_url: content_url.into(),
        }
    }

    /// Fetch and parse the content document. Any failure yields `None`.
    pub async fn load(&self) -> Option<ContentDocument> {
        match self.try_load().await {
            Ok(document) => Some(document),
            Err(e) => {
                tracing::warn!(
                    url = %self.content_url,
                    error = %e,
                    "failed to load site content JSON; using static fallbacks"
                );
                None
            }
        }
    }

    async fn try_load(&self) -> SiteResult<ContentDocument> {
        let response = self
            .fetcher
            .fetch(FetchRequest {
                url: self.content_url.clone(),
                cache: CacheMode::NoStore,
            })
            .await
            .map_err(|e| SiteError::ContentUnavailable(e.to_string()))?;

        if !response.ok() {
            return Err(SiteError::ContentUnavailable(format!(
                "unexpected status: {}",
                response.status
            )));
        }

        ContentDocument::from_json_str(&response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Canned {
        result: fn() -> SiteResult<FetchResponse>,
        requests: Mutex<Vec<FetchRequest>>,
    }

    #[async_trait]
    impl Fetcher for Canned {
        async fn fetch(&self, request: FetchRequest) -> SiteResult<FetchResponse> {
            self.requests.lock().unwrap().push(request);
            (self.result)()
        }
    }

    fn loader(result: fn() -> SiteResult<FetchResponse>) -> ContentLoader<Canned> {
        ContentLoader::new(
            Canned { result, requests: Mutex::new(vec![]) },
            "assets/data/site-content.json",
        )
    }

    #[tokio::test]
    async fn test_success_bypasses_cache() {
        let loader = loader(|| {
            Ok(FetchResponse {
                status: 200,
                body: r#"{"site": {"studio_name": "Studio"}}"#.to_string(),
            })
        });
        let doc = loader.load().await.unwrap();
        assert_eq!(doc.site.unwrap().studio_name, "Studio");

        let requests = loader.fetcher.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].cache, CacheMode::NoStore);
    }

    #[tokio::test]
    async fn test_failures_degrade_to_none() {
        let not_found = loader(|| Ok(FetchResponse { status: 404, body: String::new() }));
        assert!(not_found.load().await.is_none());

        let bad_json = loader(|| Ok(FetchResponse { status: 200, body: "{oops".to_string() }));
        assert!(bad_json.load().await.is_none());

        let offline = loader(|| Err(SiteError::ContentUnavailable("offline".to_string())));
        assert!(offline.load().await.is_none());
        assert_eq!(offline.fetcher.requests.lock().unwrap().len(), 1);
    }
}
