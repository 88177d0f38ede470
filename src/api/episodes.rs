use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::AppState;
use super::error::ApiError;
use super::types::{
    BatchResponse, BatchView, EpisodeListEntry, EpisodeRefView, EpisodeResponse, RELATED_LIMIT,
};
use crate::models::DownloadLinks;

pub async fn episode(
    State(state): State<Arc<AppState>>,
    Path(endpoint): Path<String>,
) -> Result<Json<EpisodeResponse>, ApiError> {
    let Some(episode) = state
        .scraper
        .episode_or_scrape(&endpoint)
        .await
        .map_err(|e| ApiError::internal(&e))?
    else {
        return Err(ApiError::not_found("Episode not found"));
    };

    let relative = state
        .store
        .sibling_episodes(episode.anime_id, episode.id, RELATED_LIMIT)
        .await
        .map_err(|e| ApiError::internal(&e))?
        .into_iter()
        .map(|ep| EpisodeRefView {
            title_ref: ep.episode_title,
            link_ref: ep.episode_endpoint,
        })
        .collect();

    let list_episode = state
        .store
        .episodes_for_anime(episode.anime_id)
        .await
        .map_err(|e| ApiError::internal(&e))?
        .into_iter()
        .map(|ep| EpisodeListEntry {
            list_episode_title: ep.episode_title,
            list_episode_endpoint: ep.episode_endpoint,
        })
        .collect();

    let quality = parse_links(episode.download_links.as_deref())?;

    Ok(Json(EpisodeResponse {
        title: episode.episode_title,
        base_url: format!("/api/v2/episode/{endpoint}"),
        id: episode.id,
        stream_link: episode.stream_link,
        relative,
        list_episode,
        quality,
    }))
}

pub async fn batch(
    State(state): State<Arc<AppState>>,
    Path(endpoint): Path<String>,
) -> Result<Json<BatchResponse>, ApiError> {
    let Some(batch) = state
        .scraper
        .batch_or_scrape(&endpoint)
        .await
        .map_err(|e| ApiError::internal(&e).with_null("batch"))?
    else {
        return Err(ApiError::not_found("Batch not found").with_null("batch"));
    };

    let download_list = parse_links(batch.download_links.as_deref())?;

    Ok(Json(BatchResponse {
        status: true,
        message: "success".to_string(),
        batch: BatchView {
            title: batch.batch_title,
            status: "success".to_string(),
            base_url: format!("/api/v2/batch/{endpoint}"),
            download_list,
        },
    }))
}

fn parse_links(raw: Option<&str>) -> Result<Option<DownloadLinks>, ApiError> {
    match raw {
        None | Some("") => Ok(None),
        Some(raw) => DownloadLinks::from_json(raw)
            .map(Some)
            .map_err(|e| ApiError::internal(&e)),
    }
}
