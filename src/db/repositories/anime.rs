use crate::entities::{anime, anime_genre, genre, prelude::*};
use crate::models::AnimeRecord;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tracing::debug;

/// One page of anime rows plus the pagination totals the API reports.
pub struct AnimePage {
    pub rows: Vec<anime::Model>,
    pub total_items: u64,
    pub total_pages: u64,
}

pub struct AnimeRepository {
    conn: DatabaseConnection,
}

impl AnimeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find_by_endpoint(&self, endpoint: &str) -> anyhow::Result<Option<anime::Model>> {
        Ok(Anime::find()
            .filter(anime::Column::Endpoint.eq(endpoint))
            .one(&self.conn)
            .await?)
    }

    /// Insert-if-absent-else-update keyed by the natural endpoint. Extracted
    /// fields overwrite the stored row; optional fields only overwrite when
    /// the source page actually provided them.
    pub async fn reconcile(&self, record: &AnimeRecord) -> anyhow::Result<anime::Model> {
        if let Some(existing) = self.find_by_endpoint(&record.endpoint).await? {
            return self.apply_update(existing, record).await;
        }

        let now = chrono::Utc::now().to_rfc3339();
        let active = anime::ActiveModel {
            title: Set(record.title.clone()),
            endpoint: Set(record.endpoint.clone()),
            thumb: Set(Some(record.thumb.clone())),
            status: Set(record.status.as_str().to_string()),
            rating: Set(record.rating.clone()),
            synopsis: Set(Some(record.synopsis.clone())),
            detail: Set(Some(record.detail.clone())),
            total_episode: Set(record.total_episode.clone()),
            updated_on: Set(record.updated_on.clone()),
            created_at: Set(Some(now.clone())),
            updated_at: Set(Some(now)),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(model),
            // Lost an insert race on the unique endpoint; the row is there
            // now, so fall back to the update path.
            Err(DbErr::Exec(_) | DbErr::Query(_)) => {
                let existing = self
                    .find_by_endpoint(&record.endpoint)
                    .await?
                    .ok_or_else(|| {
                        anyhow::anyhow!("insert conflict but no row for '{}'", record.endpoint)
                    })?;
                self.apply_update(existing, record).await
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn apply_update(
        &self,
        existing: anime::Model,
        record: &AnimeRecord,
    ) -> anyhow::Result<anime::Model> {
        let mut active: anime::ActiveModel = existing.into();
        active.title = Set(record.title.clone());
        active.thumb = Set(Some(record.thumb.clone()));
        active.status = Set(record.status.as_str().to_string());
        active.synopsis = Set(Some(record.synopsis.clone()));
        active.detail = Set(Some(record.detail.clone()));
        if let Some(rating) = &record.rating {
            active.rating = Set(Some(rating.clone()));
        }
        if let Some(total) = &record.total_episode {
            active.total_episode = Set(Some(total.clone()));
        }
        if let Some(updated_on) = &record.updated_on {
            active.updated_on = Set(Some(updated_on.clone()));
        }
        active.updated_at = Set(Some(chrono::Utc::now().to_rfc3339()));

        Ok(active.update(&self.conn).await?)
    }

    /// Attach genres to an anime. Re-attaching is a no-op thanks to the
    /// unique (anime_id, genre_id) index.
    pub async fn attach_genres(&self, anime_id: i32, genre_ids: &[i32]) -> anyhow::Result<()> {
        for &genre_id in genre_ids {
            let link = anime_genre::ActiveModel {
                anime_id: Set(anime_id),
                genre_id: Set(genre_id),
                ..Default::default()
            };

            let result = AnimeGenre::insert(link)
                .on_conflict(
                    OnConflict::columns([
                        anime_genre::Column::AnimeId,
                        anime_genre::Column::GenreId,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec(&self.conn)
                .await;

            match result {
                Ok(_) | Err(DbErr::RecordNotInserted) => {}
                Err(e) => return Err(e.into()),
            }
        }

        debug!("Attached {} genre(s) to anime {}", genre_ids.len(), anime_id);
        Ok(())
    }

    pub async fn genres_for(&self, anime: &anime::Model) -> anyhow::Result<Vec<genre::Model>> {
        Ok(anime
            .find_related(Genre)
            .order_by_asc(genre::Column::Name)
            .all(&self.conn)
            .await?)
    }

    pub async fn page_by_status(
        &self,
        status: &str,
        page: u64,
        per_page: u64,
    ) -> anyhow::Result<AnimePage> {
        let paginator = Anime::find()
            .filter(anime::Column::Status.eq(status))
            .order_by_desc(anime::Column::UpdatedAt)
            .paginate(&self.conn, per_page);

        let total_items = paginator.num_items().await?;
        let total_pages = paginator.num_pages().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(AnimePage {
            rows,
            total_items,
            total_pages,
        })
    }

    pub async fn page_by_genre(
        &self,
        genre: &genre::Model,
        page: u64,
        per_page: u64,
    ) -> anyhow::Result<AnimePage> {
        let paginator = genre
            .find_related(Anime)
            .order_by_asc(anime::Column::Title)
            .paginate(&self.conn, per_page);

        let total_items = paginator.num_items().await?;
        let total_pages = paginator.num_pages().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(AnimePage {
            rows,
            total_items,
            total_pages,
        })
    }

    pub async fn search_by_title(
        &self,
        query: &str,
        limit: u64,
    ) -> anyhow::Result<Vec<anime::Model>> {
        Ok(Anime::find()
            .filter(anime::Column::Title.contains(query))
            .order_by_asc(anime::Column::Title)
            .paginate(&self.conn, limit)
            .fetch_page(0)
            .await?)
    }

    pub async fn list_all(&self) -> anyhow::Result<Vec<anime::Model>> {
        Ok(Anime::find()
            .order_by_asc(anime::Column::Title)
            .all(&self.conn)
            .await?)
    }

    pub async fn list_by_status(&self, status: &str) -> anyhow::Result<Vec<anime::Model>> {
        Ok(Anime::find()
            .filter(anime::Column::Status.eq(status))
            .order_by_asc(anime::Column::Title)
            .all(&self.conn)
            .await?)
    }

    pub async fn count(&self) -> anyhow::Result<u64> {
        Ok(Anime::find().count(&self.conn).await?)
    }

    pub async fn count_by_status(&self, status: &str) -> anyhow::Result<u64> {
        Ok(Anime::find()
            .filter(anime::Column::Status.eq(status))
            .count(&self.conn)
            .await?)
    }
}
