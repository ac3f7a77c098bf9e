use std::sync::Arc;

use tokio::time::interval;

use crate::core::config::ImportConfig;
use crate::core::error::Result;
use crate::features::feeds::models::ImportJob;
use crate::features::feeds::services::{FeedService, ImportJobService};

/// Background worker draining the feed import queue
pub struct ImportProcessor {
    jobs: Arc<ImportJobService>,
    feeds: Arc<FeedService>,
    config: ImportConfig,
}

impl ImportProcessor {
    pub fn new(jobs: Arc<ImportJobService>, feeds: Arc<FeedService>, config: ImportConfig) -> Self {
        Self { jobs, feeds, config }
    }

    /// Run the processor in a background loop
    pub async fn run(&self) {
        tracing::info!(
            "Starting import processor worker (every {:?})",
            self.config.poll_interval
        );

        let mut interval = interval(self.config.poll_interval);

        loop {
            interval.tick().await;

            if let Err(e) = self.process_batch().await {
                tracing::error!("Error processing import batch: {:?}", e);
            }
        }
    }

    async fn process_batch(&self) -> Result<()> {
        let jobs = self
            .jobs
            .fetch_pending(self.config.max_retries, self.config.batch_size)
            .await?;

        if jobs.is_empty() {
            return Ok(());
        }

        tracing::info!("Processing {} pending import jobs", jobs.len());

        for job in jobs {
            self.process_job(&job).await?;
        }

        Ok(())
    }

    async fn process_job(&self, job: &ImportJob) -> Result<()> {
        tracing::info!("Importing feed {} (job {})", job.feed_id, job.id);
        self.jobs.mark_running(job.id).await?;

        match self.feeds.import_feed(job.feed_id).await {
            Ok(count) => self.jobs.mark_completed(job.id, count).await,
            Err(e) => {
                tracing::error!("Failed to import feed {}: {:?}", job.feed_id, e);
                self.jobs
                    .mark_failed(job, self.config.max_retries, &e.to_string())
                    .await
            }
        }
    }
}
