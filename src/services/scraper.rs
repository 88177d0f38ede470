use anyhow::{Result, bail};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::SourceConfig;
use crate::crawler::{ListingKind, PaginationCrawler};
use crate::db::Store;
use crate::entities::{anime, batch, episode, genre};
use crate::extract::detail::{extract_detail, genre_names};
use crate::extract::episode::{extract_batch, extract_episode};
use crate::extract::genres::extract_genres;
use crate::fetcher::Fetcher;
use crate::models::{EpisodeKind, EpisodeRef, ListingItem};

/// Outcome of one listing sync, also what the manual trigger endpoint
/// reports back.
#[derive(Debug, Default, Serialize)]
pub struct ListingReport {
    pub pages_visited: u32,
    pub anime_found: usize,
    pub anime_saved: usize,
    pub aborted: bool,
}

#[derive(Debug, Serialize)]
pub struct NewEpisodeReport {
    pub anime: String,
    pub new_episodes_found: usize,
}

/// Orchestrates fetch, extract and persist for every page type. All
/// catalog writes flow through here.
pub struct ScraperService {
    store: Arc<Store>,
    fetcher: Fetcher,
    crawler: PaginationCrawler,
    base_url: String,
}

impl ScraperService {
    pub fn new(store: Arc<Store>, config: &SourceConfig) -> Result<Self> {
        let fetcher = Fetcher::new(config)?;
        let crawler = PaginationCrawler::new(fetcher.clone(), config);
        Ok(Self {
            store,
            fetcher,
            crawler,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Refreshes the genre table from the upstream genre index.
    pub async fn sync_genres(&self) -> Result<Vec<genre::Model>> {
        let url = format!("{}/genre-list/", self.base_url);
        let page = self.fetcher.fetch(&url).await?;
        if !page.status.is_success() {
            warn!("Genre index answered {}, keeping existing genres", page.status);
            return Ok(Vec::new());
        }

        let entries = extract_genres(&page.html, &self.base_url);
        let mut saved = Vec::with_capacity(entries.len());
        for entry in &entries {
            saved.push(self.store.find_or_create_genre(entry).await?);
        }

        info!("Synced {} genres", saved.len());
        Ok(saved)
    }

    /// Walks one listing to its last page and reconciles every anime it
    /// finds, detail page included. A single failing anime is logged and
    /// skipped so the rest of the listing still lands.
    pub async fn sync_listing(&self, kind: ListingKind) -> Result<ListingReport> {
        let outcome = self.crawler.crawl(kind).await;
        let mut report = ListingReport {
            pages_visited: outcome.pages_visited,
            anime_found: outcome.items.len(),
            anime_saved: 0,
            aborted: outcome.aborted,
        };

        for item in &outcome.items {
            match self.scrape_detail_with_listing(&item.endpoint, Some(item)).await {
                Ok(_) => report.anime_saved += 1,
                Err(e) => warn!("Skipping {}: {}", item.endpoint, e),
            }
        }

        info!(
            "Listing {} sync: {}/{} anime saved over {} pages",
            kind.segment(),
            report.anime_saved,
            report.anime_found,
            report.pages_visited
        );
        Ok(report)
    }

    /// Scrapes one detail page, reconciles the anime, links its genres and
    /// fans out over every episode and batch it references.
    pub async fn scrape_detail(&self, endpoint: &str) -> Result<anime::Model> {
        self.scrape_detail_with_listing(endpoint, None).await
    }

    async fn scrape_detail_with_listing(
        &self,
        endpoint: &str,
        listing: Option<&ListingItem>,
    ) -> Result<anime::Model> {
        let url = format!("{}/anime/{}/", self.base_url, endpoint);
        let page = self.fetcher.fetch(&url).await?;
        if !page.status.is_success() {
            bail!("Detail page {} answered {}", endpoint, page.status);
        }

        let mut detail = extract_detail(&page.html, endpoint, &self.base_url);
        if detail.anime.title.is_empty() {
            bail!("Detail page {} has no title, not a detail page", endpoint);
        }

        // The listing grid carries fields the detail page lacks.
        if let Some(item) = listing {
            detail.anime.rating = item.rating.clone();
            if !item.total_episode.is_empty() {
                detail.anime.total_episode = Some(item.total_episode.clone());
            }
            if !item.updated_on.is_empty() {
                detail.anime.updated_on = Some(item.updated_on.clone());
            }
        }

        let model = self.store.reconcile_anime(&detail.anime).await?;
        self.link_genres(&model, &detail.anime.detail).await?;

        let results = join_all(
            detail
                .episode_refs
                .iter()
                .map(|r| self.scrape_ref(model.id, r)),
        )
        .await;
        for (r, result) in detail.episode_refs.iter().zip(results) {
            if let Err(e) = result {
                warn!("Sub-page {} of {} failed: {}", r.endpoint, endpoint, e);
            }
        }

        Ok(model)
    }

    /// Matches the "Genre: a, b, c" line of the detail text against known
    /// genres, case-insensitively. Names with no matching genre row are
    /// skipped; the genre sync owns creating rows.
    async fn link_genres(&self, model: &anime::Model, detail_text: &str) -> Result<()> {
        let names = genre_names(detail_text);
        if names.is_empty() {
            return Ok(());
        }

        let mut genre_ids = Vec::new();
        for name in &names {
            if let Some(genre) = self.store.genre_by_name_ci(name).await? {
                genre_ids.push(genre.id);
            }
        }
        self.store.attach_genres(model.id, &genre_ids).await
    }

    async fn scrape_ref(&self, anime_id: i32, r: &EpisodeRef) -> Result<()> {
        match r.kind {
            EpisodeKind::Episode => self.scrape_episode(anime_id, r).await.map(|_| ()),
            EpisodeKind::Batch => self.scrape_batch(anime_id, &r.endpoint).await.map(|_| ()),
        }
    }

    /// Scrapes one episode page. An already-stored endpoint short-circuits
    /// before any network traffic.
    pub async fn scrape_episode(
        &self,
        anime_id: i32,
        r: &EpisodeRef,
    ) -> Result<episode::Model> {
        if let Some(existing) = self.store.episode_by_endpoint(&r.endpoint).await? {
            return Ok(existing);
        }

        let url = format!("{}/episode/{}", self.base_url, r.endpoint);
        let page = self.fetcher.fetch(&url).await?;
        if !page.status.is_success() {
            bail!("Episode page {} answered {}", r.endpoint, page.status);
        }

        let record = extract_episode(&page.html, &r.endpoint, &r.title, &r.date);
        let (model, inserted) = self.store.insert_episode_if_absent(anime_id, &record).await?;
        if inserted {
            info!("Stored episode {}", r.endpoint);
        }
        Ok(model)
    }

    /// Scrapes one batch page, same skip-if-present rule as episodes.
    pub async fn scrape_batch(&self, anime_id: i32, endpoint: &str) -> Result<batch::Model> {
        if let Some(existing) = self.store.batch_by_endpoint(endpoint).await? {
            return Ok(existing);
        }

        let url = format!("{}/batch/{}", self.base_url, endpoint);
        let page = self.fetcher.fetch(&url).await?;
        if !page.status.is_success() {
            bail!("Batch page {} answered {}", endpoint, page.status);
        }

        let record = extract_batch(&page.html, endpoint);
        let (model, inserted) = self.store.insert_batch_if_absent(anime_id, &record).await?;
        if inserted {
            info!("Stored batch {}", endpoint);
        }
        Ok(model)
    }

    /// Re-scrapes every ongoing anime's detail page and reports how many
    /// recently stored episodes each one has.
    pub async fn check_new_episodes(&self) -> Result<Vec<NewEpisodeReport>> {
        let ongoing = self.store.list_anime_by_status("Ongoing").await?;
        let mut reports = Vec::with_capacity(ongoing.len());

        for anime in &ongoing {
            if let Err(e) = self.scrape_detail(&anime.endpoint).await {
                error!("Episode check for {} failed: {}", anime.endpoint, e);
                continue;
            }
            let recent = self.store.recent_episodes(anime.id, 5).await?;
            reports.push(NewEpisodeReport {
                anime: anime.title.clone(),
                new_episodes_found: recent.len(),
            });
        }

        info!("Episode check covered {} ongoing anime", reports.len());
        Ok(reports)
    }

    // --- just-in-time lookups for the read API ---

    /// Detail lookup with scrape-on-miss.
    pub async fn detail_or_scrape(&self, endpoint: &str) -> Result<Option<anime::Model>> {
        if let Some(model) = self.store.anime_by_endpoint(endpoint).await? {
            return Ok(Some(model));
        }

        info!("Anime {} not stored, scraping on demand", endpoint);
        if let Err(e) = self.scrape_detail(endpoint).await {
            warn!("On-demand scrape of {} failed: {}", endpoint, e);
        }
        self.store.anime_by_endpoint(endpoint).await
    }

    /// Episode lookup with scrape-on-miss. The parent anime's endpoint is
    /// derived by trimming the `-episode-N` suffix; without a stored
    /// parent the episode stays unknown.
    pub async fn episode_or_scrape(&self, endpoint: &str) -> Result<Option<episode::Model>> {
        if let Some(model) = self.store.episode_by_endpoint(endpoint).await? {
            return Ok(Some(model));
        }

        let Some(parent) = parent_of_episode(endpoint) else {
            return Ok(None);
        };
        let Some(anime) = self.store.anime_by_endpoint(parent).await? else {
            return Ok(None);
        };

        info!("Episode {} not stored, scraping on demand", endpoint);
        let r = EpisodeRef {
            title: String::new(),
            endpoint: endpoint.to_string(),
            date: String::new(),
            kind: EpisodeKind::Episode,
        };
        if let Err(e) = self.scrape_episode(anime.id, &r).await {
            warn!("On-demand scrape of episode {} failed: {}", endpoint, e);
        }
        self.store.episode_by_endpoint(endpoint).await
    }

    /// Batch lookup with scrape-on-miss, parent derived by trimming the
    /// `-batch` suffix.
    pub async fn batch_or_scrape(&self, endpoint: &str) -> Result<Option<batch::Model>> {
        if let Some(model) = self.store.batch_by_endpoint(endpoint).await? {
            return Ok(Some(model));
        }

        let Some(parent) = parent_of_batch(endpoint) else {
            return Ok(None);
        };
        let Some(anime) = self.store.anime_by_endpoint(parent).await? else {
            return Ok(None);
        };

        info!("Batch {} not stored, scraping on demand", endpoint);
        if let Err(e) = self.scrape_batch(anime.id, endpoint).await {
            warn!("On-demand scrape of batch {} failed: {}", endpoint, e);
        }
        self.store.batch_by_endpoint(endpoint).await
    }
}

fn parent_of_episode(endpoint: &str) -> Option<&str> {
    endpoint
        .find("-episode-")
        .map(|i| &endpoint[..i])
        .filter(|s| !s.is_empty())
}

fn parent_of_batch(endpoint: &str) -> Option<&str> {
    endpoint
        .find("-batch")
        .map(|i| &endpoint[..i])
        .filter(|s| !s.is_empty())
}
