use crate::entities::{genre, prelude::*};
use crate::models::GenreEntry;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

pub struct GenreRepository {
    conn: DatabaseConnection,
}

impl GenreRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find_by_endpoint(&self, endpoint: &str) -> anyhow::Result<Option<genre::Model>> {
        Ok(Genre::find()
            .filter(genre::Column::Endpoint.eq(endpoint))
            .one(&self.conn)
            .await?)
    }

    /// Case-insensitive name lookup; the genre labels embedded in detail
    /// text do not always match the genre listing's casing.
    pub async fn find_by_name_ci(&self, name: &str) -> anyhow::Result<Option<genre::Model>> {
        Ok(Genre::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(genre::Column::Name)))
                    .eq(name.trim().to_lowercase()),
            )
            .one(&self.conn)
            .await?)
    }

    pub async fn find_or_create(&self, entry: &GenreEntry) -> anyhow::Result<genre::Model> {
        if let Some(existing) = self.find_by_endpoint(&entry.endpoint).await? {
            return Ok(existing);
        }

        let active = genre::ActiveModel {
            name: Set(entry.name.clone()),
            endpoint: Set(entry.endpoint.clone()),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(model),
            Err(DbErr::Exec(_) | DbErr::Query(_)) => self
                .find_by_endpoint(&entry.endpoint)
                .await?
                .ok_or_else(|| {
                    anyhow::anyhow!("insert conflict but no row for '{}'", entry.endpoint)
                }),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list(&self) -> anyhow::Result<Vec<genre::Model>> {
        Ok(Genre::find()
            .order_by_asc(genre::Column::Name)
            .all(&self.conn)
            .await?)
    }

    pub async fn count(&self) -> anyhow::Result<u64> {
        Ok(Genre::find().count(&self.conn).await?)
    }
}
