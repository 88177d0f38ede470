use axum::{Router, http::HeaderValue, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::db::Store;
use crate::services::{Scheduler, ScraperService};

mod anime;
mod episodes;
mod error;
mod genres;
mod system;
mod types;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub scraper: Arc<ScraperService>,
    pub scheduler: Arc<Scheduler>,
}

pub fn create_router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let api_router = Router::new()
        .route("/ongoing/{page}", get(anime::get_ongoing))
        .route("/completed/{page}", get(anime::get_completed))
        .route("/search/{q}", get(anime::search))
        .route("/anime-list", get(anime::anime_list))
        .route("/detail/{endpoint}", get(anime::detail))
        .route("/episode/{endpoint}", get(episodes::episode))
        .route("/batch/{endpoint}", get(episodes::batch))
        .route("/genres", get(genres::genre_list))
        .route("/genres/{genre}/{page}", get(genres::genre_page))
        .route("/stats", get(system::stats))
        .route("/health", get(system::health))
        .route("/admin/trigger/{job}", get(system::trigger_job))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/", get(system::index))
        .nest("/api/v2", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
