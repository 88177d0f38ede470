//! Read API tests against a seeded store. The upstream base URL points at
//! a closed port so on-demand scrapes fail fast instead of hitting the
//! network.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use otakarr::api::{AppState, create_router};
use otakarr::config::{SchedulerConfig, SourceConfig};
use otakarr::db::Store;
use otakarr::models::{
    AnimeRecord, AnimeStatus, DownloadLinks, EpisodeRecord, GenreEntry, Mirror, QualityTier,
};
use otakarr::services::{Scheduler, ScraperService};

async fn spawn_app() -> (Arc<AppState>, Router) {
    let db_path = std::env::temp_dir().join(format!("otakarr-api-test-{}.db", uuid::Uuid::new_v4()));
    let store = Arc::new(
        Store::new(&format!("sqlite:{}", db_path.display()))
            .await
            .expect("failed to create test store"),
    );

    let source = SourceConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        max_retries: 1,
        request_timeout_seconds: 1,
        delay_min_ms: 0,
        delay_max_ms: 1,
        backoff_cap_ms: 1,
        page_delay_seconds: 0,
        max_pages: 1,
    };
    let scraper = Arc::new(ScraperService::new(Arc::clone(&store), &source).expect("scraper"));
    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&scraper),
        SchedulerConfig {
            enabled: false,
            ..SchedulerConfig::default()
        },
    ));

    let state = Arc::new(AppState {
        store,
        scraper,
        scheduler,
    });
    let router = create_router(Arc::clone(&state), &["*".to_string()]);
    (state, router)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).expect("body is json");
    (status, body)
}

fn anime_record(endpoint: &str, title: &str, status: AnimeStatus) -> AnimeRecord {
    AnimeRecord {
        title: title.to_string(),
        endpoint: endpoint.to_string(),
        thumb: "https://img.example/a.jpg".to_string(),
        status,
        rating: None,
        synopsis: "Line one.\nLine two.".to_string(),
        detail: "Judul: X\nGenre: Action\nStatus: Ongoing".to_string(),
        total_episode: Some("12 Episode".to_string()),
        updated_on: None,
    }
}

fn episode_record(endpoint: &str, title: &str) -> EpisodeRecord {
    EpisodeRecord {
        episode_title: title.to_string(),
        episode_endpoint: endpoint.to_string(),
        episode_date: "9 Apr".to_string(),
        stream_link: "https://stream.example/e".to_string(),
        download_links: DownloadLinks {
            low_quality: Some(QualityTier {
                quality: "360p".to_string(),
                size: "45MB".to_string(),
                download_links: vec![Mirror {
                    host: "Mega".to_string(),
                    link: "https://mir.example/1".to_string(),
                }],
            }),
            medium_quality: None,
            high_quality: None,
        },
    }
}

async fn seed_anime_with_genre(state: &AppState) -> i32 {
    let anime = state
        .store
        .reconcile_anime(&anime_record(
            "spy-x-family",
            "Spy x Family",
            AnimeStatus::Ongoing,
        ))
        .await
        .unwrap();
    let genre = state
        .store
        .find_or_create_genre(&GenreEntry {
            name: "Action".to_string(),
            endpoint: "action".to_string(),
        })
        .await
        .unwrap();
    state.store.attach_genres(anime.id, &[genre.id]).await.unwrap();
    anime.id
}

#[tokio::test]
async fn root_index_names_the_service() {
    let (_, app) = spawn_app().await;
    let (status, body) = get_json(&app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Otakarr Anime Catalog API");
    assert!(body["endpoints"]["getAnimeDetail"].is_string());
}

#[tokio::test]
async fn ongoing_listing_is_paginated() {
    let (state, app) = spawn_app().await;
    for i in 0..3 {
        state
            .store
            .reconcile_anime(&anime_record(
                &format!("show-{i}"),
                &format!("Show {i}"),
                AnimeStatus::Ongoing,
            ))
            .await
            .unwrap();
    }
    state
        .store
        .reconcile_anime(&anime_record("done-show", "Done", AnimeStatus::Completed))
        .await
        .unwrap();

    let (status, body) = get_json(&app, "/api/v2/ongoing/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], true);
    assert_eq!(body["message"], "success");
    assert_eq!(body["ongoing"].as_array().unwrap().len(), 3);
    assert_eq!(body["currentPage"], 1);
    assert_eq!(body["totalPages"], 1);
    assert_eq!(body["totalItems"], 3);

    let (_, completed) = get_json(&app, "/api/v2/completed/1").await;
    assert_eq!(completed["completed"].as_array().unwrap().len(), 1);
    assert_eq!(completed["totalItems"], 1);
}

#[tokio::test]
async fn detail_returns_upstream_shape() {
    let (state, app) = spawn_app().await;
    let anime_id = seed_anime_with_genre(&state).await;
    state
        .store
        .insert_episode_if_absent(anime_id, &episode_record("sxf-episode-1", "Episode 1"))
        .await
        .unwrap();

    let (status, body) = get_json(&app, "/api/v2/detail/spy-x-family").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], true);
    assert_eq!(body["endpoint"], "spy-x-family");
    assert_eq!(body["anime_detail"]["title"], "Spy x Family");
    assert_eq!(
        body["anime_detail"]["sinopsis"],
        serde_json::json!(["Line one.", "Line two."])
    );
    assert_eq!(body["anime_detail"]["genres"], serde_json::json!(["Action"]));
    assert_eq!(body["episode_list"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_detail_is_not_found() {
    let (_, app) = spawn_app().await;
    let (status, body) = get_json(&app, "/api/v2/detail/never-heard-of-it").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], false);
    assert_eq!(body["message"], "Anime not found");
    assert!(body["anime_detail"].is_null());
    assert_eq!(body["episode_list"], serde_json::json!([]));
}

#[tokio::test]
async fn episode_route_answers_flat_object() {
    let (state, app) = spawn_app().await;
    let anime_id = seed_anime_with_genre(&state).await;
    state
        .store
        .insert_episode_if_absent(anime_id, &episode_record("sxf-episode-1", "Episode 1"))
        .await
        .unwrap();
    state
        .store
        .insert_episode_if_absent(anime_id, &episode_record("sxf-episode-2", "Episode 2"))
        .await
        .unwrap();

    let (status, body) = get_json(&app, "/api/v2/episode/sxf-episode-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Episode 1");
    assert_eq!(body["streamLink"], "https://stream.example/e");
    assert_eq!(body["quality"]["low_quality"]["quality"], "360p");
    assert_eq!(body["relative"].as_array().unwrap().len(), 1);
    assert_eq!(body["relative"][0]["link_ref"], "sxf-episode-2");
    assert_eq!(body["list_episode"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_episode_without_stored_parent_is_not_found() {
    let (_, app) = spawn_app().await;
    let (status, body) = get_json(&app, "/api/v2/episode/ghost-show-episode-3").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], false);
    assert_eq!(body["message"], "Episode not found");
}

#[tokio::test]
async fn genre_routes_list_and_page() {
    let (state, app) = spawn_app().await;
    seed_anime_with_genre(&state).await;

    let (status, body) = get_json(&app, "/api/v2/genres").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["genres"],
        serde_json::json!([{"genre": "Action", "endpoint": "action"}])
    );

    let (status, page) = get_json(&app, "/api/v2/genres/action/1").await;
    assert_eq!(status, StatusCode::OK);
    let rows = page["genreAnime"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["title"], "Spy x Family");
    assert_eq!(rows[0]["link"], "spy-x-family");
    assert_eq!(rows[0]["genre"], serde_json::json!(["Action"]));
    assert_eq!(page["totalItems"], 1);

    let (status, missing) = get_json(&app, "/api/v2/genres/horror/1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["message"], "Genre not found");
    assert_eq!(missing["genreAnime"], serde_json::json!([]));
}

#[tokio::test]
async fn search_matches_by_title_substring() {
    let (state, app) = spawn_app().await;
    seed_anime_with_genre(&state).await;

    let (status, body) = get_json(&app, "/api/v2/search/Family").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "Family");
    let hits = body["search"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["endpoint"], "spy-x-family");
    assert_eq!(hits[0]["genres"], serde_json::json!(["Action"]));

    let (_, empty) = get_json(&app, "/api/v2/search/zzz").await;
    assert_eq!(empty["search"], serde_json::json!([]));
}

#[tokio::test]
async fn anime_list_carries_minimal_fields() {
    let (state, app) = spawn_app().await;
    seed_anime_with_genre(&state).await;

    let (status, body) = get_json(&app, "/api/v2/anime-list").await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["anime_list"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["title"], "Spy x Family");
    assert_eq!(entries[0]["endpoint"], "spy-x-family");
    assert!(entries[0]["id"].is_number());
    assert!(entries[0].get("synopsis").is_none());
}

#[tokio::test]
async fn stats_route_counts_tables() {
    let (state, app) = spawn_app().await;
    let anime_id = seed_anime_with_genre(&state).await;
    state
        .store
        .insert_episode_if_absent(anime_id, &episode_record("sxf-episode-1", "Episode 1"))
        .await
        .unwrap();

    let (status, body) = get_json(&app, "/api/v2/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["anime"]["total"], 1);
    assert_eq!(body["stats"]["anime"]["ongoing"], 1);
    assert_eq!(body["stats"]["anime"]["completed"], 0);
    assert_eq!(body["stats"]["episodes"]["total"], 1);
    assert_eq!(body["stats"]["genres"]["total"], 1);
    assert!(body["stats"]["last_updated"].is_string());
}

#[tokio::test]
async fn unknown_job_trigger_is_rejected() {
    let (_, app) = spawn_app().await;
    let (status, body) = get_json(&app, "/api/v2/admin/trigger/nightly").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], false);
    assert_eq!(body["message"], "Unknown job: nightly");
}

#[tokio::test]
async fn health_route_reports_database_readiness() {
    let (_, app) = spawn_app().await;
    let (status, body) = get_json(&app, "/api/v2/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], true);
    assert_eq!(body["database"], true);
    assert_eq!(body["scheduler_running"], false);
}

#[tokio::test]
async fn search_error_envelope_keeps_its_list_key() {
    use sea_orm::{ConnectionTrait, Statement};

    let (state, app) = spawn_app().await;
    seed_anime_with_genre(&state).await;

    // Break the genre join so resolving genres for the hit fails.
    let backend = state.store.conn.get_database_backend();
    state
        .store
        .conn
        .execute(Statement::from_string(
            backend,
            "DROP TABLE anime_genre".to_string(),
        ))
        .await
        .unwrap();

    let (status, body) = get_json(&app, "/api/v2/search/spy").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], false);
    assert_eq!(body["search"], serde_json::json!([]));
}
