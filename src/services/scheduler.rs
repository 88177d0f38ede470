use anyhow::{Result, bail};
use serde::Serialize;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::SchedulerConfig;
use crate::crawler::ListingKind;
use crate::services::scraper::{ListingReport, NewEpisodeReport, ScraperService};

/// The jobs the scheduler knows, by the names the trigger endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobName {
    Initial,
    Episodes,
    Ongoing,
    Completed,
    Genres,
}

impl JobName {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Episodes => "episodes",
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
            Self::Genres => "genres",
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown job: {0}")]
pub struct UnknownJob(pub String);

impl FromStr for JobName {
    type Err = UnknownJob;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial" => Ok(Self::Initial),
            "episodes" => Ok(Self::Episodes),
            "ongoing" => Ok(Self::Ongoing),
            "completed" => Ok(Self::Completed),
            "genres" => Ok(Self::Genres),
            other => Err(UnknownJob(other.to_string())),
        }
    }
}

/// What a finished job hands back to its caller.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum JobReport {
    Listing(ListingReport),
    Episodes(Vec<NewEpisodeReport>),
    Genres {
        genres_synced: usize,
    },
    Initial {
        genres_synced: usize,
        ongoing: ListingReport,
        completed: ListingReport,
    },
}

/// Owns the cron registry and the one-shot startup scrape. Jobs run the
/// scraper service; a job name already in flight is not started a second
/// time.
pub struct Scheduler {
    scraper: Arc<ScraperService>,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
    in_flight: Mutex<HashSet<&'static str>>,
}

impl Scheduler {
    pub fn new(scraper: Arc<ScraperService>, config: SchedulerConfig) -> Self {
        Self {
            scraper,
            config,
            running: Arc::new(RwLock::new(false)),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Runs the startup scrape, registers the cron jobs and parks until
    /// `stop` is called.
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting background scheduler");

        if self.config.run_initial_scrape {
            self.tick(JobName::Initial).await;
        }

        let mut sched = JobScheduler::new().await?;
        sched
            .add(self.cron_job(&self.config.episodes_cron, JobName::Episodes)?)
            .await?;
        sched
            .add(self.cron_job(&self.config.ongoing_cron, JobName::Ongoing)?)
            .await?;
        sched
            .add(self.cron_job(&self.config.completed_cron, JobName::Completed)?)
            .await?;
        sched
            .add(self.cron_job(&self.config.genres_cron, JobName::Genres)?)
            .await?;
        sched.start().await?;

        info!(
            "Scheduler running: episodes '{}', ongoing '{}', completed '{}', genres '{}'",
            self.config.episodes_cron,
            self.config.ongoing_cron,
            self.config.completed_cron,
            self.config.genres_cron
        );

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    fn cron_job(self: &Arc<Self>, cron_expr: &str, name: JobName) -> Result<Job> {
        let me = Arc::clone(self);
        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let me = Arc::clone(&me);
            Box::pin(async move {
                if !*me.running.read().await {
                    return;
                }
                me.tick(name).await;
            })
        })?;
        Ok(job)
    }

    async fn tick(&self, name: JobName) {
        let start = std::time::Instant::now();
        info!(event = "job_started", job_name = name.as_str(), "Starting scheduled job");

        match self.run_job(name).await {
            Ok(_) => info!(
                event = "job_finished",
                job_name = name.as_str(),
                duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                "Scheduled job finished"
            ),
            Err(e) => error!(
                event = "job_failed",
                job_name = name.as_str(),
                error = %e,
                "Scheduled job failed"
            ),
        }
    }

    /// Runs one job to completion. Also the entry point for the manual
    /// trigger endpoint.
    pub async fn run_job(&self, name: JobName) -> Result<JobReport> {
        let key = name.as_str();
        {
            let mut in_flight = self.in_flight.lock().await;
            if !in_flight.insert(key) {
                bail!("Job {key} is already running");
            }
        }

        let result = self.execute(name).await;
        self.in_flight.lock().await.remove(key);
        result
    }

    async fn execute(&self, name: JobName) -> Result<JobReport> {
        match name {
            JobName::Genres => {
                let genres = self.scraper.sync_genres().await?;
                Ok(JobReport::Genres {
                    genres_synced: genres.len(),
                })
            }
            JobName::Ongoing => Ok(JobReport::Listing(
                self.scraper.sync_listing(ListingKind::Ongoing).await?,
            )),
            JobName::Completed => Ok(JobReport::Listing(
                self.scraper.sync_listing(ListingKind::Completed).await?,
            )),
            JobName::Episodes => Ok(JobReport::Episodes(
                self.scraper.check_new_episodes().await?,
            )),
            JobName::Initial => {
                let genres = self.scraper.sync_genres().await?;
                let ongoing = self.scraper.sync_listing(ListingKind::Ongoing).await?;
                let completed = self.scraper.sync_listing(ListingKind::Completed).await?;
                Ok(JobReport::Initial {
                    genres_synced: genres.len(),
                    ongoing,
                    completed,
                })
            }
        }
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::db::Store;

    #[test]
    fn test_job_name_round_trip() {
        for name in [
            JobName::Initial,
            JobName::Episodes,
            JobName::Ongoing,
            JobName::Completed,
            JobName::Genres,
        ] {
            assert_eq!(name.as_str().parse::<JobName>().unwrap(), name);
        }
    }

    #[test]
    fn test_unknown_job_is_an_error() {
        let err = "nightly".parse::<JobName>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown job: nightly");
    }

    #[tokio::test]
    async fn test_stop_unparks_a_started_scheduler() {
        let store = Arc::new(Store::new("sqlite::memory:").await.unwrap());
        let scraper = Arc::new(ScraperService::new(store, &SourceConfig::default()).unwrap());
        let scheduler = Arc::new(Scheduler::new(
            scraper,
            SchedulerConfig {
                run_initial_scrape: false,
                ..SchedulerConfig::default()
            },
        ));

        let handle = {
            let sched = Arc::clone(&scheduler);
            tokio::spawn(async move { sched.start().await })
        };

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(scheduler.is_running().await);

        scheduler.stop().await;
        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("start() never returned after stop()")
            .expect("scheduler task panicked");
        assert!(result.is_ok());
        assert!(!scheduler.is_running().await);
    }
}
