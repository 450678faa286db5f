//! HTTP access behind a small trait.
//!
//! Every network call of the pipeline (feed, baseline snapshot, video pages)
//! goes through [`Fetch`], so tests can swap the real [`HttpClient`] for
//! canned responses.

use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Status and body of a completed GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body decoded as text.
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for issuing GET requests.
///
/// Implementations return `Err` only for transport failures; an error status
/// is still an `Ok` response and callers decide what it means.
pub trait Fetch {
    /// Fetch `url` and return its status and body.
    async fn get(&self, url: &str) -> Result<HttpResponse, Box<dyn Error>>;
}

/// [`Fetch`] implementation backed by `reqwest`.
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Build a client with the crate's user agent and a request timeout.
    pub fn new(timeout: Duration) -> Result<Self, Box<dyn Error>> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient").finish_non_exhaustive()
    }
}

impl Fetch for HttpClient {
    #[instrument(level = "debug", skip(self))]
    async fn get(&self, url: &str) -> Result<HttpResponse, Box<dyn Error>> {
        let t0 = Instant::now();
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(elapsed_ms = t0.elapsed().as_millis(), error = %e, "GET failed");
                return Err(e.into());
            }
        };
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(
            status,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "GET completed"
        );
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;

    /// Serves canned responses; unknown URLs fail like a refused connection.
    #[derive(Debug, Default)]
    pub struct StubFetcher {
        responses: HashMap<String, HttpResponse>,
    }

    impl StubFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, url: &str, status: u16, body: &str) -> Self {
            self.responses.insert(
                url.to_string(),
                HttpResponse {
                    status,
                    body: body.to_string(),
                },
            );
            self
        }
    }

    impl Fetch for StubFetcher {
        async fn get(&self, url: &str) -> Result<HttpResponse, Box<dyn Error>> {
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| format!("connection refused: {url}").into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::StubFetcher;
    use super::*;

    #[test]
    fn test_is_success_range() {
        let ok = HttpResponse { status: 204, body: String::new() };
        let not_found = HttpResponse { status: 404, body: String::new() };
        let redirect = HttpResponse { status: 301, body: String::new() };
        assert!(ok.is_success());
        assert!(!not_found.is_success());
        assert!(!redirect.is_success());
    }

    #[test]
    fn test_client_builds() {
        assert!(HttpClient::new(Duration::from_secs(5)).is_ok());
    }

    #[tokio::test]
    async fn test_stub_fetcher_serves_and_refuses() {
        let stub = StubFetcher::new().with("https://example.com/a", 200, "hello");
        let response = stub.get("https://example.com/a").await.unwrap();
        assert_eq!(response.body, "hello");
        assert!(stub.get("https://example.com/missing").await.is_err());
    }
}
