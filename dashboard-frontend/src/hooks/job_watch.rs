//! Single-job query for the job monitor: polls while the job is still
//! pending or processing and goes quiet once it settles.

use crate::models::Job;
use crate::services::{keys, ApiError, DashboardApi, QueryCache, QueryKey};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobPolling {
    pub interval: Duration,
    /// Freshness window of the cached job.
    pub stale_after: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct JobState {
    pub job: Option<Job>,
    pub is_loading: bool,
    pub error: Option<ApiError>,
}

impl JobState {
    pub fn is_polling(&self) -> bool {
        self.job.as_ref().is_some_and(|job| job.status.is_active())
    }
}

/// Read a job through the cache using the job freshness window.
pub async fn fetch_job_cached(
    api: &dyn DashboardApi,
    cache: &QueryCache,
    id: &str,
    stale_after: Duration,
) -> Result<Job, ApiError> {
    let key = keys::item(keys::JOBS, id);
    if let Some(hit) = cache.get_fresh_within::<Job>(&key, stale_after) {
        tracing::debug!(key = %key, "Job served from cache");
        return Ok(hit);
    }

    let job = api.get_job(id).await?;
    cache.set(key, job.clone());
    Ok(job)
}

/// Background task keeping a [`JobState`] current for one job.
///
/// Mutations that store the authoritative job under its item key are picked
/// up as soon as they invalidate the jobs lists; deleting the job ends the
/// polling with a not-found error.
pub struct JobWatcher {
    state: watch::Receiver<JobState>,
    refetch: mpsc::UnboundedSender<()>,
    task: JoinHandle<()>,
}

impl JobWatcher {
    pub fn spawn(
        api: Arc<dyn DashboardApi>,
        cache: Arc<QueryCache>,
        id: impl Into<String>,
        polling: JobPolling,
    ) -> Self {
        let id = id.into();
        let (state_tx, state) = watch::channel(JobState {
            is_loading: true,
            ..JobState::default()
        });
        let (refetch, refetch_rx) = mpsc::unbounded_channel();
        let invalidations = cache.subscribe();

        let poller = Poller {
            key: keys::item(keys::JOBS, &id),
            id,
            api,
            cache,
            polling,
            state: state_tx,
            next_poll: Instant::now() + polling.interval,
        };
        let task = tokio::spawn(poller.run(refetch_rx, invalidations));

        Self {
            state,
            refetch,
            task,
        }
    }

    pub fn state(&self) -> JobState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<JobState> {
        self.state.clone()
    }

    pub fn refetch(&self) {
        let _ = self.refetch.send(());
    }
}

impl Drop for JobWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Poller {
    id: String,
    key: QueryKey,
    api: Arc<dyn DashboardApi>,
    cache: Arc<QueryCache>,
    polling: JobPolling,
    state: watch::Sender<JobState>,
    next_poll: Instant,
}

impl Poller {
    async fn run(
        mut self,
        mut refetch: mpsc::UnboundedReceiver<()>,
        mut invalidations: broadcast::Receiver<QueryKey>,
    ) {
        match self
            .cache
            .get_fresh_within::<Job>(&self.key, self.polling.stale_after)
        {
            Some(job) => {
                tracing::debug!(key = %self.key, "Job served from cache");
                self.publish(job);
            }
            None => self.fetch().await,
        }

        loop {
            let polling = self.state.borrow().is_polling();
            tokio::select! {
                _ = sleep_until(self.next_poll), if polling => self.fetch().await,
                Some(()) = refetch.recv() => self.fetch().await,
                invalidated = invalidations.recv() => match invalidated {
                    Ok(prefix) if self.key.starts_with(&prefix) => self.fetch().await,
                    Ok(prefix) if prefix.starts_with(&keys::root(keys::JOBS)) => self.adopt_cached(),
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, job_id = %self.id, "Missed cache invalidations, refetching");
                        self.fetch().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    }

    async fn fetch(&mut self) {
        self.state.send_modify(|state| state.is_loading = true);
        let result = self.api.get_job(&self.id).await;
        self.next_poll = Instant::now() + self.polling.interval;

        match result {
            Ok(job) => {
                self.cache.set(self.key.clone(), job.clone());
                self.publish(job);
            }
            Err(err) => {
                tracing::warn!(
                    job_id = %self.id,
                    code = %err.code,
                    status = err.status,
                    "Job fetch failed"
                );
                let gone = err.status == 404;
                self.state.send_modify(|state| {
                    state.is_loading = false;
                    if gone {
                        state.job = None;
                    }
                    state.error = Some(err);
                });
            }
        }
    }

    /// Take a job a mutation just stored, if it differs from what we show.
    fn adopt_cached(&mut self) {
        let Some(job) = self
            .cache
            .get_fresh_within::<Job>(&self.key, self.polling.stale_after)
        else {
            return;
        };
        if self.state.borrow().job.as_ref() != Some(&job) {
            self.next_poll = Instant::now() + self.polling.interval;
            self.publish(job);
        }
    }

    fn publish(&self, job: Job) {
        let was_active = self.state.borrow().is_polling();
        if was_active && !job.status.is_active() {
            tracing::info!(job_id = %self.id, status = %job.status, "Job settled");
        }
        self.state.send_replace(JobState {
            job: Some(job),
            is_loading: false,
            error: None,
        });
    }
}
