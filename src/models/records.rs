use serde::{Deserialize, Serialize};
use std::fmt;

use super::DownloadLinks;

/// Airing status as the upstream lists it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimeStatus {
    Ongoing,
    Completed,
}

impl AnimeStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ongoing => "Ongoing",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for AnimeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry from an ongoing/completed listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingItem {
    pub title: String,
    pub endpoint: String,
    pub thumb: String,
    pub total_episode: String,
    pub updated_on: String,
    /// Only the completed listing exposes a rating label.
    pub rating: Option<String>,
    pub status: AnimeStatus,
}

/// A fully extracted anime record ready for reconciliation. The `detail`
/// text keeps the upstream's embedded "Genre: a, b, c" line; genre linking
/// reads it back out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimeRecord {
    pub title: String,
    pub endpoint: String,
    pub thumb: String,
    pub status: AnimeStatus,
    pub rating: Option<String>,
    pub synopsis: String,
    pub detail: String,
    pub total_episode: Option<String>,
    pub updated_on: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeKind {
    Episode,
    Batch,
}

/// A reference to an episode or batch sub-page discovered on a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRef {
    pub title: String,
    pub endpoint: String,
    pub date: String,
    pub kind: EpisodeKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRecord {
    pub episode_title: String,
    pub episode_endpoint: String,
    pub episode_date: String,
    pub stream_link: String,
    pub download_links: DownloadLinks,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRecord {
    pub batch_title: String,
    pub batch_endpoint: String,
    pub download_links: DownloadLinks,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreEntry {
    pub name: String,
    pub endpoint: String,
}
