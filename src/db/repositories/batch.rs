use crate::entities::{batch, prelude::*};
use crate::models::BatchRecord;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use tracing::debug;

pub struct BatchRepository {
    conn: DatabaseConnection,
}

impl BatchRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find_by_endpoint(&self, endpoint: &str) -> anyhow::Result<Option<batch::Model>> {
        Ok(Batch::find()
            .filter(batch::Column::BatchEndpoint.eq(endpoint))
            .one(&self.conn)
            .await?)
    }

    /// Same skip-on-exists policy as episodes.
    pub async fn insert_if_absent(
        &self,
        anime_id: i32,
        record: &BatchRecord,
    ) -> anyhow::Result<(batch::Model, bool)> {
        if let Some(existing) = self.find_by_endpoint(&record.batch_endpoint).await? {
            debug!("Batch {} already stored, skipping", record.batch_endpoint);
            return Ok((existing, false));
        }

        let active = batch::ActiveModel {
            anime_id: Set(anime_id),
            batch_title: Set(record.batch_title.clone()),
            batch_endpoint: Set(record.batch_endpoint.clone()),
            download_links: Set(Some(record.download_links.to_json()?)),
            created_at: Set(Some(chrono::Utc::now().to_rfc3339())),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok((model, true)),
            Err(DbErr::Exec(_) | DbErr::Query(_)) => {
                let existing = self
                    .find_by_endpoint(&record.batch_endpoint)
                    .await?
                    .ok_or_else(|| {
                        anyhow::anyhow!("insert conflict but no row for '{}'", record.batch_endpoint)
                    })?;
                Ok((existing, false))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn count(&self) -> anyhow::Result<u64> {
        Ok(Batch::find().count(&self.conn).await?)
    }
}
