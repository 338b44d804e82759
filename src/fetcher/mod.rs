//! Document fetchers: plain HTTP and on-disk snapshots of rendered pages

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use thiserror::Error;
use tracing::{info, warn};

use crate::traits::Fetcher;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Phrases served by anti-bot interstitials instead of the real page
const CHALLENGE_MARKERS: [&str; 4] = [
    "<title>Just a moment",
    "Verifying you are human",
    "cf-challenge",
    "challenge-platform",
];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("anti-bot challenge page served instead of content")]
    Challenge,

    #[error("failed to read snapshot {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

/// Returns true when the body is a bot-verification page rather than content
pub fn looks_like_challenge(body: &str) -> bool {
    CHALLENGE_MARKERS.iter().any(|marker| body.contains(marker))
}

/// Fetches static HTML with a browser-like client, retrying failed attempts
pub struct HttpFetcher {
    client: Client,
    attempts: u32,
    retry_delay: Duration,
}

impl HttpFetcher {
    pub fn new(attempts: u32, retry_delay: Duration) -> Result<Self, FetchError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_static("en-US,en;q=0.5"),
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            attempts: attempts.max(1),
            retry_delay,
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let body = response.text().await?;
        if looks_like_challenge(&body) {
            return Err(FetchError::Challenge);
        }

        Ok(body)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 1;

        loop {
            info!("Fetching {} (attempt {}/{})", url, attempt, self.attempts);

            match self.fetch_once(url).await {
                Ok(body) => {
                    info!("Page loaded ({} bytes)", body.len());
                    return Ok(body);
                }
                Err(e) if attempt < self.attempts => {
                    warn!("Attempt {} failed: {}", attempt, e);
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(FetchError::Exhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
            }
        }
    }
}

/// Reads a page that was already rendered and saved by a real browser
#[derive(Debug, Clone)]
pub struct SnapshotFetcher {
    path: PathBuf,
}

impl SnapshotFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Fetcher for SnapshotFetcher {
    fn name(&self) -> &str {
        "snapshot"
    }

    async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
        info!("Reading rendered page from {}", self.path.display());

        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| FetchError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const CHALLENGE_PAGE: &str =
        "<html><head><title>Just a moment...</title></head><body></body></html>";

    /// Serves one canned `(status line, body)` response per connection, in order
    async fn serve(responses: Vec<(&'static str, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();

                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                }

                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
        });

        format!("http://{addr}/user/someone/shows")
    }

    #[tokio::test]
    async fn retries_after_server_error() {
        let url = serve(vec![
            ("500 Internal Server Error", "oops"),
            ("200 OK", "<html>shows</html>"),
        ])
        .await;

        let fetcher = HttpFetcher::new(3, Duration::from_millis(1)).unwrap();
        let body = fetcher.fetch(&url).await.unwrap();
        assert_eq!(body, "<html>shows</html>");
    }

    #[tokio::test]
    async fn challenge_pages_exhaust_attempts() {
        let url = serve(vec![("200 OK", CHALLENGE_PAGE); 3]).await;

        let fetcher = HttpFetcher::new(3, Duration::from_millis(1)).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();

        match err {
            FetchError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, FetchError::Challenge));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn not_found_is_a_status_error() {
        let url = serve(vec![("404 Not Found", "missing")]).await;

        let fetcher = HttpFetcher::new(1, Duration::from_millis(1)).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();

        match err {
            FetchError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 1);
                assert!(matches!(*last, FetchError::Status(s) if s == StatusCode::NOT_FOUND));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn detects_cloudflare_interstitial() {
        let body = "<html><head><title>Just a moment...</title></head><body>Verifying you are human</body></html>";
        assert!(looks_like_challenge(body));
    }

    #[test]
    fn regular_page_is_not_a_challenge() {
        let body = r#"<html><head><title>Shows</title></head><body><a href="/live/abc">x</a></body></html>"#;
        assert!(!looks_like_challenge(body));
    }

    #[tokio::test]
    async fn attempts_are_at_least_one() {
        let fetcher = HttpFetcher::new(0, Duration::from_millis(1)).unwrap();
        assert_eq!(fetcher.attempts, 1);
    }

    #[tokio::test]
    async fn snapshot_fetcher_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<html>saved</html>").unwrap();

        let fetcher = SnapshotFetcher::new(&path);
        let body = fetcher.fetch("ignored").await.unwrap();
        assert_eq!(body, "<html>saved</html>");
    }

    #[tokio::test]
    async fn snapshot_fetcher_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = SnapshotFetcher::new(dir.path().join("missing.html"));

        let err = fetcher.fetch("ignored").await.unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }
}
