use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::config::CrawlerConfig;
use crate::error::CrawlError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Status and content type only
    Head,
    Get,
}

/// Outcome of a single request attempt.
///
/// Transport failures land in `error`, a non-200 answer has a `status` and no
/// `error`. Both count as a failed fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResult {
    pub status: Option<u16>,
    pub content_type: Option<String>,
    pub body: Option<Vec<u8>>,
    pub error: Option<String>,
}

impl FetchResult {
    pub fn ok(status: u16, content_type: Option<&str>, body: Vec<u8>) -> Self {
        Self {
            status: Some(status),
            content_type: content_type.map(|c| c.to_lowercase()),
            body: Some(body),
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Some(200) && self.error.is_none()
    }

    pub fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, Vec::len)
    }

    /// The failure as a [`CrawlError::FetchFailed`], `None` on success.
    pub fn failure(&self, url: &str) -> Option<CrawlError> {
        if self.is_success() {
            return None;
        }
        let reason = match (&self.error, self.status) {
            (Some(e), _) => e.clone(),
            (None, Some(status)) => format!("status {status}"),
            (None, None) => String::from("no response"),
        };
        Some(CrawlError::FetchFailed {
            url: url.to_string(),
            reason,
        })
    }
}

/// A single bounded attempt per call, no retries.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str, method: Method) -> FetchResult;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let client = reqwest::ClientBuilder::new()
            .gzip(true)
            .deflate(true)
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .build()?;
        Ok(Self { client })
    }

    async fn send(&self, url: &str, method: Method) -> reqwest::Result<FetchResult> {
        let req = match method {
            Method::Head => self.client.head(url),
            Method::Get => self.client.get(url),
        };
        let resp = req.send().await?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|c| c.to_str().ok())
            .map(str::to_lowercase);
        let body = match method {
            Method::Head => None,
            Method::Get => Some(resp.bytes().await?.to_vec()),
        };

        Ok(FetchResult {
            status: Some(status),
            content_type,
            body,
            error: None,
        })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str, method: Method) -> FetchResult {
        match self.send(url, method).await {
            Ok(res) => res,
            Err(e) => FetchResult::failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_needs_200_and_no_error() {
        assert!(FetchResult::ok(200, Some("Text/HTML"), vec![]).is_success());
        assert!(!FetchResult::ok(404, None, vec![]).is_success());
        assert!(!FetchResult::failed("timeout").is_success());
    }

    #[test]
    fn content_type_is_lowercased() {
        let res = FetchResult::ok(200, Some("Application/PDF"), b"%PDF".to_vec());
        assert_eq!(res.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(res.body_len(), 4);
    }

    #[test]
    fn failure_reason() {
        let not_found = FetchResult::ok(404, None, vec![]).failure("http://x.example/");
        assert!(matches!(
            not_found,
            Some(CrawlError::FetchFailed { reason, .. }) if reason == "status 404"
        ));
        let dns = FetchResult::failed("dns error").failure("http://x.example/");
        assert_eq!(
            dns.map(|e| e.to_string()),
            Some("Couldn't fetch http://x.example/ got: dns error".to_string())
        );
        assert!(FetchResult::ok(200, None, vec![]).failure("http://x.example/").is_none());
    }
}
