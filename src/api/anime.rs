use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::error::ApiError;
use super::types::{
    AnimeDetail, AnimeListEntry, AnimeListResponse, AnimeWithGenres, CompletedResponse,
    DetailResponse, OngoingResponse, PAGE_SIZE, SEARCH_LIMIT, SearchResponse,
};
use super::AppState;
use crate::entities::anime;

pub async fn get_ongoing(
    State(state): State<Arc<AppState>>,
    Path(page): Path<u64>,
) -> Result<Json<OngoingResponse>, ApiError> {
    let page = page.max(1);
    let result = state
        .store
        .anime_page_by_status("Ongoing", page, PAGE_SIZE)
        .await
        .map_err(|e| ApiError::internal(&e).with_list("ongoing"))?;

    Ok(Json(OngoingResponse {
        status: true,
        message: "success".to_string(),
        ongoing: result.rows,
        current_page: page,
        total_pages: result.total_pages,
        total_items: result.total_items,
    }))
}

pub async fn get_completed(
    State(state): State<Arc<AppState>>,
    Path(page): Path<u64>,
) -> Result<Json<CompletedResponse>, ApiError> {
    let page = page.max(1);
    let result = state
        .store
        .anime_page_by_status("Completed", page, PAGE_SIZE)
        .await
        .map_err(|e| ApiError::internal(&e).with_list("completed"))?;

    Ok(Json(CompletedResponse {
        status: true,
        message: "success".to_string(),
        completed: result.rows,
        current_page: page,
        total_pages: result.total_pages,
        total_items: result.total_items,
    }))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Path(query): Path<String>,
) -> Result<Json<SearchResponse>, ApiError> {
    let rows = state
        .store
        .search_anime(&query, SEARCH_LIMIT)
        .await
        .map_err(|e| ApiError::internal(&e).with_list("search"))?;

    let mut search = Vec::with_capacity(rows.len());
    for row in rows {
        let genres = genre_names_for(&state, &row)
            .await
            .map_err(|e| ApiError::internal(&e).with_list("search"))?;
        search.push(AnimeWithGenres { anime: row, genres });
    }

    Ok(Json(SearchResponse {
        status: true,
        message: "success".to_string(),
        search,
        query,
    }))
}

pub async fn anime_list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AnimeListResponse>, ApiError> {
    let rows = state
        .store
        .list_anime()
        .await
        .map_err(|e| ApiError::internal(&e).with_list("anime_list"))?;

    let anime_list = rows
        .into_iter()
        .map(|a| AnimeListEntry {
            id: a.id,
            title: a.title,
            endpoint: a.endpoint,
        })
        .collect();

    Ok(Json(AnimeListResponse {
        status: true,
        message: "success".to_string(),
        anime_list,
    }))
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(endpoint): Path<String>,
) -> Result<Json<DetailResponse>, ApiError> {
    let detail_err = |e: &anyhow::Error| {
        ApiError::internal(e)
            .with_null("anime_detail")
            .with_list("episode_list")
    };

    let Some(anime) = state
        .scraper
        .detail_or_scrape(&endpoint)
        .await
        .map_err(|e| detail_err(&e))?
    else {
        return Err(ApiError::not_found("Anime not found")
            .with_null("anime_detail")
            .with_list("episode_list"));
    };

    let episode_list = state
        .store
        .episodes_for_anime(anime.id)
        .await
        .map_err(|e| detail_err(&e))?;
    let genres = genre_names_for(&state, &anime)
        .await
        .map_err(|e| detail_err(&e))?;

    Ok(Json(DetailResponse {
        status: true,
        message: "success".to_string(),
        anime_detail: AnimeDetail {
            title: anime.title.clone(),
            thumb: anime.thumb.clone(),
            sinopsis: split_lines(anime.synopsis.as_deref()),
            detail: split_lines(anime.detail.as_deref()),
            genres,
        },
        episode_list,
        endpoint,
    }))
}

async fn genre_names_for(state: &AppState, row: &anime::Model) -> anyhow::Result<Vec<String>> {
    let genres = state.store.genres_for_anime(row).await?;
    Ok(genres.into_iter().map(|g| g.name).collect())
}

fn split_lines(text: Option<&str>) -> Vec<String> {
    match text {
        None | Some("") => Vec::new(),
        Some(text) => text.lines().map(ToString::to_string).collect(),
    }
}
