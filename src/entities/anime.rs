use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "anime")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    /// Natural key derived from the source URL path segment.
    #[sea_orm(unique)]
    pub endpoint: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub thumb: Option<String>,
    /// "Ongoing" or "Completed".
    pub status: String,
    pub rating: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub synopsis: Option<String>,
    /// Paragraph-joined info block; still carries the embedded
    /// "Genre: a, b, c" line used for genre linking.
    #[sea_orm(column_type = "Text", nullable)]
    pub detail: Option<String>,
    pub total_episode: Option<String>,
    pub updated_on: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::episode::Entity")]
    Episode,
    #[sea_orm(has_one = "super::batch::Entity")]
    Batch,
    #[sea_orm(has_many = "super::anime_genre::Entity")]
    AnimeGenre,
}

impl Related<super::episode::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Episode.def()
    }
}

impl Related<super::batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batch.def()
    }
}

impl Related<super::genre::Entity> for Entity {
    fn to() -> RelationDef {
        super::anime_genre::Relation::Genre.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::anime_genre::Relation::Anime.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
