use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::AppState;
use super::error::ApiError;
use super::types::{GenreAnimeView, GenreListResponse, GenrePageResponse, GenreView, PAGE_SIZE};

pub async fn genre_list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<GenreListResponse>, ApiError> {
    let genres = state
        .store
        .list_genres()
        .await
        .map_err(|e| ApiError::internal(&e).with_list("genres"))?
        .into_iter()
        .map(|g| GenreView {
            genre: g.name,
            endpoint: g.endpoint,
        })
        .collect();

    Ok(Json(GenreListResponse {
        status: true,
        message: "success".to_string(),
        genres,
    }))
}

pub async fn genre_page(
    State(state): State<Arc<AppState>>,
    Path((genre_endpoint, page)): Path<(String, u64)>,
) -> Result<Json<GenrePageResponse>, ApiError> {
    let page = page.max(1);
    let genre_err = |e: &anyhow::Error| ApiError::internal(e).with_list("genreAnime");

    let Some(genre) = state
        .store
        .genre_by_endpoint(&genre_endpoint)
        .await
        .map_err(|e| genre_err(&e))?
    else {
        return Err(ApiError::not_found("Genre not found").with_list("genreAnime"));
    };

    let result = state
        .store
        .anime_page_by_genre(&genre, page, PAGE_SIZE)
        .await
        .map_err(|e| genre_err(&e))?;

    let mut genre_anime = Vec::with_capacity(result.rows.len());
    for row in result.rows {
        let genres = state
            .store
            .genres_for_anime(&row)
            .await
            .map_err(|e| genre_err(&e))?;
        genre_anime.push(GenreAnimeView {
            title: row.title,
            link: row.endpoint,
            studio: String::new(),
            episode: row.total_episode,
            rating: row.rating,
            thumb: row.thumb,
            genre: genres.into_iter().map(|g| g.name).collect(),
            sinopsis: row.synopsis,
        });
    }

    Ok(Json(GenrePageResponse {
        status: true,
        message: "success".to_string(),
        genre_anime,
        current_page: page,
        total_pages: result.total_pages,
        total_items: result.total_items,
    }))
}
