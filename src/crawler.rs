use std::time::Duration;
use tracing::{info, warn};

use crate::config::SourceConfig;
use crate::extract::listing::extract_listing;
use crate::fetcher::Fetcher;
use crate::models::{AnimeStatus, ListingItem};

/// Which paginated listing to walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    Ongoing,
    Completed,
}

impl ListingKind {
    #[must_use]
    pub const fn segment(self) -> &'static str {
        match self {
            Self::Ongoing => "ongoing-anime",
            Self::Completed => "complete-anime",
        }
    }

    #[must_use]
    pub const fn status(self) -> AnimeStatus {
        match self {
            Self::Ongoing => AnimeStatus::Ongoing,
            Self::Completed => AnimeStatus::Completed,
        }
    }
}

/// The result of one listing walk. `aborted` means a fetch exhausted its
/// retries partway through; whatever was collected before that is kept.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    pub items: Vec<ListingItem>,
    pub pages_visited: u32,
    pub aborted: bool,
}

/// Walks an ongoing or completed listing page by page, strictly
/// sequentially, until the pagination control reports the last page, the
/// upstream stops answering with success, or the page ceiling is hit.
pub struct PaginationCrawler {
    fetcher: Fetcher,
    base_url: String,
    page_delay: Duration,
    max_pages: u32,
}

impl PaginationCrawler {
    #[must_use]
    pub fn new(fetcher: Fetcher, config: &SourceConfig) -> Self {
        Self {
            fetcher,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_delay: Duration::from_secs(config.page_delay_seconds),
            max_pages: config.max_pages.max(1),
        }
    }

    pub async fn crawl(&self, kind: ListingKind) -> CrawlOutcome {
        let mut outcome = CrawlOutcome::default();

        for page in 1..=self.max_pages {
            if page > 1 {
                tokio::time::sleep(self.page_delay).await;
            }

            let url = self.page_url(kind, page);
            let fetched = match self.fetcher.fetch(&url).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    warn!("Crawl of {} aborted on page {}: {}", kind.segment(), page, e);
                    outcome.aborted = true;
                    break;
                }
            };

            if !fetched.status.is_success() {
                // Paging past the end answers with a soft 404 page.
                info!(
                    "Listing {} ended with status {} on page {}",
                    kind.segment(),
                    fetched.status,
                    page
                );
                break;
            }

            let items = extract_listing(&fetched.html, kind.status(), &self.base_url);
            outcome.pages_visited += 1;
            outcome.items.extend(items);

            if fetched.is_last_page {
                break;
            }
            if page == self.max_pages {
                warn!(
                    "Listing {} still paginating at the {}-page ceiling, stopping",
                    kind.segment(),
                    self.max_pages
                );
            }
        }

        info!(
            "Crawled {} pages of {}: {} entries{}",
            outcome.pages_visited,
            kind.segment(),
            outcome.items.len(),
            if outcome.aborted { " (aborted)" } else { "" }
        );
        outcome
    }

    fn page_url(&self, kind: ListingKind, page: u32) -> String {
        if page == 1 {
            format!("{}/{}/", self.base_url, kind.segment())
        } else {
            format!("{}/{}/page/{}/", self.base_url, kind.segment(), page)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;

    fn crawler_for(base_url: &str, max_pages: u32) -> PaginationCrawler {
        let config = SourceConfig {
            base_url: base_url.to_string(),
            max_retries: 1,
            request_timeout_seconds: 2,
            delay_min_ms: 0,
            delay_max_ms: 1,
            backoff_cap_ms: 1,
            page_delay_seconds: 0,
            max_pages,
        };
        PaginationCrawler::new(Fetcher::new(&config).unwrap(), &config)
    }

    #[test]
    fn test_page_url_scheme() {
        let crawler = crawler_for("https://otakudesu.watch/", 200);
        assert_eq!(
            crawler.page_url(ListingKind::Ongoing, 1),
            "https://otakudesu.watch/ongoing-anime/"
        );
        assert_eq!(
            crawler.page_url(ListingKind::Completed, 7),
            "https://otakudesu.watch/complete-anime/page/7/"
        );
    }

    async fn spawn_listing_server(pages: Vec<String>) -> std::net::SocketAddr {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let mut buf = [0u8; 2048];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();

                let page = if request.contains("/page/") {
                    request
                        .split("/page/")
                        .nth(1)
                        .and_then(|rest| rest.split('/').next())
                        .and_then(|n| n.parse::<usize>().ok())
                        .unwrap_or(1)
                } else {
                    1
                };

                let (status, body) = match pages.get(page - 1) {
                    Some(html) => ("200 OK", html.clone()),
                    None => ("404 Not Found", "<html>gone</html>".to_string()),
                };
                let response = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: text/html\r\ncontent-length: {}\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });

        addr
    }

    fn listing_page(base: &str, slug: &str, with_next: bool) -> String {
        let pagination = if with_next {
            r#"<div class="pagination"><a href="/page/2/">Next</a></div>"#
        } else {
            r#"<div class="pagination"><span class="current">2</span></div>"#
        };
        format!(
            r#"<div class="rapi"><ul><li>
                <div class="thumb"><a href="{base}/anime/{slug}/"><img src="x.jpg"></a></div>
                <h2>{slug}</h2><div class="epz">Episode 1</div><div class="newnime">1 Jan</div>
            </li></ul></div>{pagination}"#
        )
    }

    #[tokio::test]
    async fn test_crawl_stops_at_last_page() {
        let base = "http://unused";
        let addr = spawn_listing_server(vec![
            listing_page(base, "first-anime", true),
            listing_page(base, "second-anime", false),
            listing_page(base, "never-reached", false),
        ])
        .await;

        let crawler = crawler_for(&format!("http://{addr}"), 200);
        let outcome = crawler.crawl(ListingKind::Ongoing).await;

        assert_eq!(outcome.pages_visited, 2);
        assert_eq!(outcome.items.len(), 2);
        assert!(!outcome.aborted);
    }

    #[tokio::test]
    async fn test_crawl_honors_page_ceiling() {
        let base = "http://unused";
        let addr = spawn_listing_server(vec![
            listing_page(base, "a", true),
            listing_page(base, "b", true),
            listing_page(base, "c", true),
            listing_page(base, "d", true),
        ])
        .await;

        let crawler = crawler_for(&format!("http://{addr}"), 3);
        let outcome = crawler.crawl(ListingKind::Ongoing).await;

        assert_eq!(outcome.pages_visited, 3);
        assert!(!outcome.aborted);
    }

    #[tokio::test]
    async fn test_crawl_treats_soft_404_as_end() {
        let base = "http://unused";
        let addr = spawn_listing_server(vec![listing_page(base, "only", true)]).await;

        let crawler = crawler_for(&format!("http://{addr}"), 200);
        let outcome = crawler.crawl(ListingKind::Completed).await;

        assert_eq!(outcome.pages_visited, 1);
        assert_eq!(outcome.items.len(), 1);
        assert!(!outcome.aborted);
    }
}
