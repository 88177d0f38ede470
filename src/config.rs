use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub source: SourceConfig,

    pub scheduler: SchedulerConfig,

    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/otakarr.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL of the upstream catalog site.
    pub base_url: String,

    /// Retry attempts per fetch before giving up.
    pub max_retries: u32,

    /// Per-attempt HTTP timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Random pre-request delay bounds, in milliseconds. The upstream
    /// rate-limits aggressively; every request waits a uniform interval
    /// inside these bounds first.
    pub delay_min_ms: u64,
    pub delay_max_ms: u64,

    /// Exponential backoff ceiling between retries, in milliseconds.
    pub backoff_cap_ms: u64,

    /// Fixed delay between listing pages during a crawl, in seconds.
    pub page_delay_seconds: u64,

    /// Absolute ceiling on listing pages per crawl. The last-page signal is
    /// a markup heuristic; this stops a crawl if the signal never arrives.
    pub max_pages: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://otakudesu.watch".to_string(),
            max_retries: 3,
            request_timeout_seconds: 15,
            delay_min_ms: 2000,
            delay_max_ms: 5000,
            backoff_cap_ms: 10_000,
            page_delay_seconds: 5,
            max_pages: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Master switch for automatic scraping. Manual triggers via the API
    /// still work when this is off.
    pub enabled: bool,

    /// Run the full initial scrape (genres, ongoing, completed) once at
    /// daemon startup before any recurring job fires.
    pub run_initial_scrape: bool,

    /// Cron expressions (with seconds field) for the recurring jobs.
    pub episodes_cron: String,
    pub ongoing_cron: String,
    pub completed_cron: String,
    pub genres_cron: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            run_initial_scrape: true,
            // hourly / daily 1AM / weekly Sunday 2AM / monthly 1st 3AM
            episodes_cron: "0 0 * * * *".to_string(),
            ongoing_cron: "0 0 1 * * *".to_string(),
            completed_cron: "0 0 2 * * Sun".to_string(),
            genres_cron: "0 0 3 1 * *".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8000,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            source: SourceConfig::default(),
            scheduler: SchedulerConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("otakarr").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".otakarr").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.source.base_url.is_empty() {
            anyhow::bail!("source.base_url cannot be empty");
        }

        if self.source.delay_min_ms > self.source.delay_max_ms {
            anyhow::bail!("source.delay_min_ms must be <= source.delay_max_ms");
        }

        if self.source.max_pages == 0 {
            anyhow::bail!("source.max_pages must be > 0");
        }

        // A cron typo must fail startup, not leave the jobs silently dead.
        for (field, expr) in [
            ("episodes_cron", &self.scheduler.episodes_cron),
            ("ongoing_cron", &self.scheduler.ongoing_cron),
            ("completed_cron", &self.scheduler.completed_cron),
            ("genres_cron", &self.scheduler.genres_cron),
        ] {
            tokio_cron_scheduler::Job::new_async(expr.as_str(), |_uuid, _lock| {
                Box::pin(async {})
            })
            .map_err(|e| {
                anyhow::anyhow!("scheduler.{field} is not a valid cron expression ({expr:?}): {e}")
            })?;
        }

        Ok(())
    }
}
