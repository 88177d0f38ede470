use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::{anime, batch, episode, genre};
use crate::models::{AnimeRecord, BatchRecord, EpisodeRecord, GenreEntry};

pub mod migrator;
pub mod repositories;

pub use repositories::anime::AnimePage;

/// Counts per entity type, served by the stats endpoint.
#[derive(Debug, Clone, Copy)]
pub struct StoreStats {
    pub anime_total: u64,
    pub anime_ongoing: u64,
    pub anime_completed: u64,
    pub episodes: u64,
    pub batches: u64,
    pub genres: u64,
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn anime_repo(&self) -> repositories::anime::AnimeRepository {
        repositories::anime::AnimeRepository::new(self.conn.clone())
    }

    fn episode_repo(&self) -> repositories::episode::EpisodeRepository {
        repositories::episode::EpisodeRepository::new(self.conn.clone())
    }

    fn batch_repo(&self) -> repositories::batch::BatchRepository {
        repositories::batch::BatchRepository::new(self.conn.clone())
    }

    fn genre_repo(&self) -> repositories::genre::GenreRepository {
        repositories::genre::GenreRepository::new(self.conn.clone())
    }

    // --- anime ---

    pub async fn reconcile_anime(&self, record: &AnimeRecord) -> Result<anime::Model> {
        self.anime_repo().reconcile(record).await
    }

    pub async fn anime_by_endpoint(&self, endpoint: &str) -> Result<Option<anime::Model>> {
        self.anime_repo().find_by_endpoint(endpoint).await
    }

    pub async fn attach_genres(&self, anime_id: i32, genre_ids: &[i32]) -> Result<()> {
        self.anime_repo().attach_genres(anime_id, genre_ids).await
    }

    pub async fn genres_for_anime(&self, model: &anime::Model) -> Result<Vec<genre::Model>> {
        self.anime_repo().genres_for(model).await
    }

    pub async fn anime_page_by_status(
        &self,
        status: &str,
        page: u64,
        per_page: u64,
    ) -> Result<AnimePage> {
        self.anime_repo()
            .page_by_status(status, page, per_page)
            .await
    }

    pub async fn anime_page_by_genre(
        &self,
        genre: &genre::Model,
        page: u64,
        per_page: u64,
    ) -> Result<AnimePage> {
        self.anime_repo().page_by_genre(genre, page, per_page).await
    }

    pub async fn search_anime(&self, query: &str, limit: u64) -> Result<Vec<anime::Model>> {
        self.anime_repo().search_by_title(query, limit).await
    }

    pub async fn list_anime(&self) -> Result<Vec<anime::Model>> {
        self.anime_repo().list_all().await
    }

    pub async fn list_anime_by_status(&self, status: &str) -> Result<Vec<anime::Model>> {
        self.anime_repo().list_by_status(status).await
    }

    // --- episode ---

    pub async fn insert_episode_if_absent(
        &self,
        anime_id: i32,
        record: &EpisodeRecord,
    ) -> Result<(episode::Model, bool)> {
        self.episode_repo().insert_if_absent(anime_id, record).await
    }

    pub async fn episode_by_endpoint(&self, endpoint: &str) -> Result<Option<episode::Model>> {
        self.episode_repo().find_by_endpoint(endpoint).await
    }

    pub async fn episodes_for_anime(&self, anime_id: i32) -> Result<Vec<episode::Model>> {
        self.episode_repo().list_for_anime(anime_id).await
    }

    pub async fn recent_episodes(&self, anime_id: i32, limit: u64) -> Result<Vec<episode::Model>> {
        self.episode_repo().recent_for_anime(anime_id, limit).await
    }

    pub async fn sibling_episodes(
        &self,
        anime_id: i32,
        exclude_id: i32,
        limit: u64,
    ) -> Result<Vec<episode::Model>> {
        self.episode_repo()
            .siblings(anime_id, exclude_id, limit)
            .await
    }

    // --- batch ---

    pub async fn insert_batch_if_absent(
        &self,
        anime_id: i32,
        record: &BatchRecord,
    ) -> Result<(batch::Model, bool)> {
        self.batch_repo().insert_if_absent(anime_id, record).await
    }

    pub async fn batch_by_endpoint(&self, endpoint: &str) -> Result<Option<batch::Model>> {
        self.batch_repo().find_by_endpoint(endpoint).await
    }

    // --- genre ---

    pub async fn find_or_create_genre(&self, entry: &GenreEntry) -> Result<genre::Model> {
        self.genre_repo().find_or_create(entry).await
    }

    pub async fn genre_by_name_ci(&self, name: &str) -> Result<Option<genre::Model>> {
        self.genre_repo().find_by_name_ci(name).await
    }

    pub async fn genre_by_endpoint(&self, endpoint: &str) -> Result<Option<genre::Model>> {
        self.genre_repo().find_by_endpoint(endpoint).await
    }

    pub async fn list_genres(&self) -> Result<Vec<genre::Model>> {
        self.genre_repo().list().await
    }

    // --- stats ---

    pub async fn stats(&self) -> Result<StoreStats> {
        let anime_repo = self.anime_repo();
        Ok(StoreStats {
            anime_total: anime_repo.count().await?,
            anime_ongoing: anime_repo.count_by_status("Ongoing").await?,
            anime_completed: anime_repo.count_by_status("Completed").await?,
            episodes: self.episode_repo().count().await?,
            batches: self.batch_repo().count().await?,
            genres: self.genre_repo().count().await?,
        })
    }
}
