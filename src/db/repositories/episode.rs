use crate::entities::{episode, prelude::*};
use crate::models::EpisodeRecord;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::debug;

pub struct EpisodeRepository {
    conn: DatabaseConnection,
}

impl EpisodeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find_by_endpoint(&self, endpoint: &str) -> anyhow::Result<Option<episode::Model>> {
        Ok(Episode::find()
            .filter(episode::Column::EpisodeEndpoint.eq(endpoint))
            .one(&self.conn)
            .await?)
    }

    /// Create-if-absent-else-skip. Episode pages are treated as immutable
    /// once scraped, so an existing row is returned untouched. The bool is
    /// true when a row was actually inserted.
    pub async fn insert_if_absent(
        &self,
        anime_id: i32,
        record: &EpisodeRecord,
    ) -> anyhow::Result<(episode::Model, bool)> {
        if let Some(existing) = self.find_by_endpoint(&record.episode_endpoint).await? {
            debug!("Episode {} already stored, skipping", record.episode_endpoint);
            return Ok((existing, false));
        }

        let active = episode::ActiveModel {
            anime_id: Set(anime_id),
            episode_title: Set(record.episode_title.clone()),
            episode_endpoint: Set(record.episode_endpoint.clone()),
            episode_date: Set(Some(record.episode_date.clone())),
            stream_link: Set(Some(record.stream_link.clone())),
            download_links: Set(Some(record.download_links.to_json()?)),
            created_at: Set(Some(chrono::Utc::now().to_rfc3339())),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok((model, true)),
            // A concurrent scrape of the same endpoint won the insert; the
            // skip policy means we simply adopt its row.
            Err(DbErr::Exec(_) | DbErr::Query(_)) => {
                let existing = self
                    .find_by_endpoint(&record.episode_endpoint)
                    .await?
                    .ok_or_else(|| {
                        anyhow::anyhow!(
                            "insert conflict but no row for '{}'",
                            record.episode_endpoint
                        )
                    })?;
                Ok((existing, false))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_for_anime(&self, anime_id: i32) -> anyhow::Result<Vec<episode::Model>> {
        Ok(Episode::find()
            .filter(episode::Column::AnimeId.eq(anime_id))
            .order_by_desc(episode::Column::EpisodeTitle)
            .all(&self.conn)
            .await?)
    }

    pub async fn recent_for_anime(
        &self,
        anime_id: i32,
        limit: u64,
    ) -> anyhow::Result<Vec<episode::Model>> {
        Ok(Episode::find()
            .filter(episode::Column::AnimeId.eq(anime_id))
            .order_by_desc(episode::Column::CreatedAt)
            .limit(limit)
            .all(&self.conn)
            .await?)
    }

    pub async fn siblings(
        &self,
        anime_id: i32,
        exclude_id: i32,
        limit: u64,
    ) -> anyhow::Result<Vec<episode::Model>> {
        Ok(Episode::find()
            .filter(episode::Column::AnimeId.eq(anime_id))
            .filter(episode::Column::Id.ne(exclude_id))
            .order_by_desc(episode::Column::CreatedAt)
            .limit(limit)
            .all(&self.conn)
            .await?)
    }

    pub async fn count(&self) -> anyhow::Result<u64> {
        Ok(Episode::find().count(&self.conn).await?)
    }
}
