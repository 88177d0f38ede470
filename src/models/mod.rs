pub mod links;
pub mod records;

pub use links::{DownloadLinks, Mirror, QualityTier};
pub use records::{
    AnimeRecord, AnimeStatus, BatchRecord, EpisodeKind, EpisodeRecord, EpisodeRef, GenreEntry,
    ListingItem,
};
