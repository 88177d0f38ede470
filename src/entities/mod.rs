pub mod prelude;

pub mod anime;
pub mod anime_genre;
pub mod batch;
pub mod episode;
pub mod genre;
