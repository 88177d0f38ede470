pub mod api;
pub mod config;
pub mod crawler;
pub mod db;
pub mod entities;
pub mod extract;
pub mod fetcher;
pub mod models;
pub mod services;

use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use api::AppState;
pub use config::Config;
use db::Store;
use services::{Scheduler, ScraperService};

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        None | Some("daemon" | "-d" | "--daemon") => run_daemon(config).await,
        Some("init") => {
            if Config::create_default_if_missing()? {
                println!("Wrote default config file");
            } else {
                println!("Config file already exists, leaving it untouched");
            }
            Ok(())
        }
        Some("help" | "-h" | "--help") => {
            print_help();
            Ok(())
        }
        Some(other) => {
            println!("Unknown command: {other}\n");
            print_help();
            Ok(())
        }
    }
}

async fn run_daemon(config: Config) -> anyhow::Result<()> {
    info!(
        "Otakarr v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    let store = Arc::new(
        Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?,
    );

    let scraper = Arc::new(ScraperService::new(Arc::clone(&store), &config.source)?);
    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&scraper),
        config.scheduler.clone(),
    ));

    let scheduler_handle = {
        let sched = Arc::clone(&scheduler);
        tokio::spawn(async move {
            if let Err(e) = sched.start().await {
                error!("Scheduler error: {}", e);
            }
        })
    };

    let server_handle: Option<tokio::task::JoinHandle<()>> = if config.server.enabled {
        let state = Arc::new(AppState {
            store,
            scraper,
            scheduler: Arc::clone(&scheduler),
        });
        let app = api::create_router(state, &config.server.cors_allowed_origins);
        let addr = format!("0.0.0.0:{}", config.server.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        Some(tokio::spawn(async move {
            info!("Web API running at http://{addr}");
            if let Err(e) = axum::serve(listener, app).await {
                error!("Web server error: {}", e);
            }
        }))
    } else {
        None
    };

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }

    scheduler.stop().await;
    // The park loop notices the stop flag within a second and shuts the
    // cron scheduler down cleanly.
    if let Err(e) = scheduler_handle.await {
        error!("Scheduler task did not stop cleanly: {}", e);
    }
    if let Some(handle) = server_handle {
        handle.abort();
    }
    info!("Daemon stopped");

    Ok(())
}

fn print_help() {
    println!("Otakarr - anime catalog crawler and API");
    println!();
    println!("Usage: otakarr [command]");
    println!();
    println!("Commands:");
    println!("  daemon      Run the crawler, scheduler and web API (default)");
    println!("  init        Write a default config file if none exists");
    println!("  help        Show this help");
}
