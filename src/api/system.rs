use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::sync::Arc;

use super::AppState;
use super::error::ApiError;
use super::types::{AnimeStats, CountedStat, Stats, StatsResponse, TriggerResponse};
use crate::services::JobName;

/// Root index: names the service and enumerates its routes.
pub async fn index() -> Json<Value> {
    Json(json!({
        "name": "Otakarr Anime Catalog API",
        "version": "v2.0",
        "endpoints": {
            "getOngoingAnime": "/api/v2/ongoing/{page}",
            "getCompletedAnime": "/api/v2/completed/{page}",
            "getAnimeSearch": "/api/v2/search/{q}",
            "getAnimeList": "/api/v2/anime-list",
            "getAnimeDetail": "/api/v2/detail/{endpoint}",
            "getAnimeEpisode": "/api/v2/episode/{endpoint}",
            "getBatchLink": "/api/v2/batch/{endpoint}",
            "getGenreList": "/api/v2/genres",
            "getGenrePage": "/api/v2/genres/{genre}/{page}",
            "getStats": "/api/v2/stats",
            "getHealth": "/api/v2/health",
        }
    }))
}

/// Readiness probe: checks database connectivity and reports whether the
/// background scheduler is up.
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let database = state.store.ping().await.is_ok();
    let scheduler_running = state.scheduler.is_running().await;

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let message = if database {
        "success"
    } else {
        "database unreachable"
    };

    (
        status,
        Json(json!({
            "status": database,
            "message": message,
            "database": database,
            "scheduler_running": scheduler_running,
        })),
    )
        .into_response()
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<StatsResponse>, ApiError> {
    let counts = state
        .store
        .stats()
        .await
        .map_err(|e| ApiError::internal(&e))?;

    Ok(Json(StatsResponse {
        status: true,
        message: "success".to_string(),
        stats: Stats {
            anime: AnimeStats {
                total: counts.anime_total,
                ongoing: counts.anime_ongoing,
                completed: counts.anime_completed,
            },
            episodes: CountedStat {
                total: counts.episodes,
            },
            batches: CountedStat {
                total: counts.batches,
            },
            genres: CountedStat {
                total: counts.genres,
            },
            last_updated: chrono::Utc::now().to_rfc3339(),
        },
    }))
}

/// Kicks off one scheduler job by name and waits for its report.
pub async fn trigger_job(
    State(state): State<Arc<AppState>>,
    Path(job): Path<String>,
) -> Result<Json<TriggerResponse>, ApiError> {
    let name: JobName = job.parse().map_err(|e: crate::services::UnknownJob| {
        ApiError::bad_request(e.to_string())
    })?;

    let result = state
        .scheduler
        .run_job(name)
        .await
        .map_err(|e| ApiError::internal(&e))?;

    Ok(Json(TriggerResponse {
        status: true,
        message: format!("Job {job} triggered successfully"),
        result,
    }))
}
