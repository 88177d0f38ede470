pub mod anime;
pub mod batch;
pub mod episode;
pub mod genre;
