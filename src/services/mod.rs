pub mod scheduler;
pub mod scraper;

pub use scheduler::{JobName, JobReport, Scheduler, UnknownJob};
pub use scraper::{ListingReport, NewEpisodeReport, ScraperService};
