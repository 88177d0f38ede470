pub use super::anime::Entity as Anime;
pub use super::anime_genre::Entity as AnimeGenre;
pub use super::batch::Entity as Batch;
pub use super::episode::Entity as Episode;
pub use super::genre::Entity as Genre;
