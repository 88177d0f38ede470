use rand::Rng;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::SourceConfig;
use crate::extract::selectors::SelectorSet;

/// Fixed pool of desktop browser user agents, rotated per attempt.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch of {url} failed after {attempts} attempts: {last_error}")]
    Exhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },
}

/// A successfully retrieved page. Soft-404s land here too: the upstream
/// serves 4xx status codes with parseable content pages.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub html: String,
    pub status: StatusCode,
    pub is_last_page: bool,
}

#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    max_retries: u32,
    delay_min_ms: u64,
    delay_max_ms: u64,
    backoff_cap_ms: u64,
}

impl Fetcher {
    pub fn new(config: &SourceConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .cookie_store(true)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            client,
            max_retries: config.max_retries.max(1),
            delay_min_ms: config.delay_min_ms,
            delay_max_ms: config.delay_max_ms,
            backoff_cap_ms: config.backoff_cap_ms,
        })
    }

    /// One politely-paced, retried GET. Every attempt first sleeps a random
    /// jitter interval and presents a random user agent; network errors and
    /// statuses outside [200, 500) retry with capped exponential backoff.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let mut last_error = String::new();

        for attempt in 0..self.max_retries {
            tokio::time::sleep(Duration::from_millis(self.jitter_ms())).await;

            let request = self
                .client
                .get(url)
                .header("User-Agent", random_user_agent())
                .header(
                    "Accept",
                    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                )
                .header("Accept-Language", "en-US,en;q=0.9")
                .header("Cache-Control", "max-age=0")
                .header("Upgrade-Insecure-Requests", "1");

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.as_u16() >= 200 && status.as_u16() < 500 {
                        match response.text().await {
                            Ok(html) => {
                                let is_last_page = detect_last_page(&html);
                                debug!("Fetched {} ({}, last_page={})", url, status, is_last_page);
                                return Ok(FetchedPage {
                                    html,
                                    status,
                                    is_last_page,
                                });
                            }
                            Err(e) => last_error = format!("body read failed: {e}"),
                        }
                    } else {
                        last_error = format!("unexpected status {status}");
                    }
                }
                Err(e) => last_error = e.to_string(),
            }

            warn!("Attempt {} for {} failed: {}", attempt + 1, url, last_error);

            if attempt + 1 < self.max_retries {
                tokio::time::sleep(Duration::from_millis(self.backoff_ms(attempt + 1))).await;
            }
        }

        Err(FetchError::Exhausted {
            url: url.to_string(),
            attempts: self.max_retries,
            last_error,
        })
    }

    fn jitter_ms(&self) -> u64 {
        if self.delay_max_ms <= self.delay_min_ms {
            return self.delay_min_ms;
        }
        let mut rng = rand::rng();
        rng.random_range(self.delay_min_ms..=self.delay_max_ms)
    }

    fn backoff_ms(&self, retries: u32) -> u64 {
        let exp = 1000u64.saturating_mul(2u64.saturating_pow(retries));
        exp.min(self.backoff_cap_ms)
    }
}

fn random_user_agent() -> &'static str {
    let mut rng = rand::rng();
    USER_AGENTS[rng.random_range(0..USER_AGENTS.len())]
}

/// A page is the last in its pagination sequence when it has no pagination
/// control at all (single-page listings) or the control lacks a "Next"
/// anchor.
fn detect_last_page(html: &str) -> bool {
    let sel = SelectorSet::get();
    let doc = scraper::Html::parse_document(html);

    let Some(pagination) = doc.select(&sel.pagination).next() else {
        return true;
    };

    !pagination
        .select(&sel.anchor)
        .any(|a| a.text().collect::<String>().contains("Next"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config() -> SourceConfig {
        SourceConfig {
            max_retries: 3,
            request_timeout_seconds: 2,
            delay_min_ms: 0,
            delay_max_ms: 1,
            backoff_cap_ms: 1,
            ..SourceConfig::default()
        }
    }

    #[test]
    fn test_last_page_when_no_pagination_control() {
        assert!(detect_last_page("<html><body><div class='venz'></div></body></html>"));
    }

    #[test]
    fn test_not_last_page_with_next_anchor() {
        let html = r#"<div class="pagination">
            <a href="/page/1/">1</a>
            <a href="/page/2/">Next</a>
        </div>"#;
        assert!(!detect_last_page(html));
    }

    #[test]
    fn test_last_page_without_next_anchor() {
        let html = r#"<div class="pagination">
            <a href="/page/3/">Prev</a>
            <span class="current">4</span>
        </div>"#;
        assert!(detect_last_page(html));
    }

    #[test]
    fn test_backoff_is_capped() {
        let fetcher = Fetcher::new(&SourceConfig {
            backoff_cap_ms: 10_000,
            ..SourceConfig::default()
        })
        .unwrap();
        assert_eq!(fetcher.backoff_ms(1), 2000);
        assert_eq!(fetcher.backoff_ms(2), 4000);
        assert_eq!(fetcher.backoff_ms(10), 10_000);
    }

    #[tokio::test]
    async fn test_retry_bound_against_failing_upstream() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicU32::new(0));

        let server_hits = Arc::clone(&hits);
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                server_hits.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\n\r\n")
                    .await;
            }
        });

        let fetcher = Fetcher::new(&fast_config()).unwrap();
        let result = fetcher.fetch(&format!("http://{addr}/ongoing-anime/")).await;

        match result {
            Err(FetchError::Exhausted { attempts, .. }) => assert_eq!(attempts, 3),
            Ok(_) => panic!("expected exhaustion"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_soft_404_is_returned_not_retried() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicU32::new(0));

        let server_hits = Arc::clone(&hits);
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                server_hits.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let body = b"<html><body>not found</body></html>";
                let header = format!(
                    "HTTP/1.1 404 Not Found\r\ncontent-length: {}\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(header.as_bytes()).await;
                let _ = socket.write_all(body).await;
            }
        });

        let fetcher = Fetcher::new(&fast_config()).unwrap();
        let page = fetcher
            .fetch(&format!("http://{addr}/anime/missing/"))
            .await
            .unwrap();

        assert_eq!(page.status.as_u16(), 404);
        assert!(page.is_last_page);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
