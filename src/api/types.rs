use serde::Serialize;

use crate::entities::{anime, episode};
use crate::models::DownloadLinks;
use crate::services::JobReport;

pub const PAGE_SIZE: u64 = 20;
pub const SEARCH_LIMIT: u64 = 30;
pub const RELATED_LIMIT: u64 = 5;

/// An anime row with its genre names resolved.
#[derive(Debug, Serialize)]
pub struct AnimeWithGenres {
    #[serde(flatten)]
    pub anime: anime::Model,
    pub genres: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct OngoingResponse {
    pub status: bool,
    pub message: String,
    pub ongoing: Vec<anime::Model>,
    #[serde(rename = "currentPage")]
    pub current_page: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
    #[serde(rename = "totalItems")]
    pub total_items: u64,
}

#[derive(Debug, Serialize)]
pub struct CompletedResponse {
    pub status: bool,
    pub message: String,
    pub completed: Vec<anime::Model>,
    #[serde(rename = "currentPage")]
    pub current_page: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
    #[serde(rename = "totalItems")]
    pub total_items: u64,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub status: bool,
    pub message: String,
    pub search: Vec<AnimeWithGenres>,
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct AnimeListEntry {
    pub id: i32,
    pub title: String,
    pub endpoint: String,
}

#[derive(Debug, Serialize)]
pub struct AnimeListResponse {
    pub status: bool,
    pub message: String,
    pub anime_list: Vec<AnimeListEntry>,
}

/// Detail payload in the upstream's historical shape: synopsis and detail
/// as line arrays, genres by name.
#[derive(Debug, Serialize)]
pub struct AnimeDetail {
    pub title: String,
    pub thumb: Option<String>,
    pub sinopsis: Vec<String>,
    pub detail: Vec<String>,
    pub genres: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub status: bool,
    pub message: String,
    pub anime_detail: AnimeDetail,
    pub episode_list: Vec<episode::Model>,
    pub endpoint: String,
}

#[derive(Debug, Serialize)]
pub struct EpisodeRefView {
    pub title_ref: String,
    pub link_ref: String,
}

#[derive(Debug, Serialize)]
pub struct EpisodeListEntry {
    pub list_episode_title: String,
    pub list_episode_endpoint: String,
}

/// The episode route answers with a flat object rather than the usual
/// envelope; consumers of the upstream shape expect it that way.
#[derive(Debug, Serialize)]
pub struct EpisodeResponse {
    pub title: String,
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    pub id: i32,
    #[serde(rename = "streamLink")]
    pub stream_link: Option<String>,
    pub relative: Vec<EpisodeRefView>,
    pub list_episode: Vec<EpisodeListEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<DownloadLinks>,
}

#[derive(Debug, Serialize)]
pub struct BatchView {
    pub title: String,
    pub status: String,
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_list: Option<DownloadLinks>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub status: bool,
    pub message: String,
    pub batch: BatchView,
}

#[derive(Debug, Serialize)]
pub struct GenreView {
    pub genre: String,
    pub endpoint: String,
}

#[derive(Debug, Serialize)]
pub struct GenreListResponse {
    pub status: bool,
    pub message: String,
    pub genres: Vec<GenreView>,
}

#[derive(Debug, Serialize)]
pub struct GenreAnimeView {
    pub title: String,
    pub link: String,
    pub studio: String,
    pub episode: Option<String>,
    pub rating: Option<String>,
    pub thumb: Option<String>,
    pub genre: Vec<String>,
    pub sinopsis: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenrePageResponse {
    pub status: bool,
    pub message: String,
    #[serde(rename = "genreAnime")]
    pub genre_anime: Vec<GenreAnimeView>,
    #[serde(rename = "currentPage")]
    pub current_page: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
    #[serde(rename = "totalItems")]
    pub total_items: u64,
}

#[derive(Debug, Serialize)]
pub struct CountedStat {
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct AnimeStats {
    pub total: u64,
    pub ongoing: u64,
    pub completed: u64,
}

#[derive(Debug, Serialize)]
pub struct Stats {
    pub anime: AnimeStats,
    pub episodes: CountedStat,
    pub batches: CountedStat,
    pub genres: CountedStat,
    pub last_updated: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub status: bool,
    pub message: String,
    pub stats: Stats,
}

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub status: bool,
    pub message: String,
    pub result: JobReport,
}
