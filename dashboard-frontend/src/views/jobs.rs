use super::{DashboardContext, ListView};
use crate::hooks::{JobMutations, JobPolling, JobWatcher, MutationError, MutationOutcome};
use crate::models::{Job, JobStatus, JobType};
use crate::query::{Filter, JobFilters, Location};
use crate::services::{DashboardApi, Jobs, QueryCache};
use std::ops::Deref;
use std::sync::Arc;

/// The jobs page.
pub struct JobsView {
    list: ListView<Jobs>,
    mutations: JobMutations,
    api: Arc<dyn DashboardApi>,
    cache: Arc<QueryCache>,
    polling: JobPolling,
}

impl JobsView {
    pub fn new(context: &DashboardContext, location: Arc<dyn Location>) -> Self {
        Self {
            list: ListView::new(context, location),
            mutations: JobMutations::new(
                Arc::clone(&context.api),
                Arc::clone(&context.cache),
                Arc::clone(&context.notifier),
                Arc::clone(&context.confirm),
            ),
            api: Arc::clone(&context.api),
            cache: Arc::clone(&context.cache),
            polling: context.list.job_polling(),
        }
    }

    /// Monitor one job until it completes, fails or is cancelled.
    pub fn watch_job(&self, id: &str) -> JobWatcher {
        JobWatcher::spawn(
            Arc::clone(&self.api),
            Arc::clone(&self.cache),
            id,
            self.polling,
        )
    }

    pub fn mutations(&self) -> &JobMutations {
        &self.mutations
    }

    pub fn set_status(&self, status: Filter<JobStatus>) {
        self.list
            .update_filters(|filters: &mut JobFilters| filters.status = status);
    }

    pub fn set_type(&self, job_type: Filter<JobType>) {
        self.list
            .update_filters(|filters: &mut JobFilters| filters.job_type = job_type);
    }

    pub fn set_project(&self, project_id: Filter<String>) {
        self.list
            .update_filters(|filters: &mut JobFilters| filters.project_id = project_id);
    }

    pub async fn delete(&self, job: &Job) -> Result<MutationOutcome<()>, MutationError> {
        self.mutations.delete(job).await
    }

    pub async fn start(&self, job: &Job) -> Result<Job, MutationError> {
        self.mutations.start(&job.id).await
    }

    pub async fn cancel(&self, job: &Job) -> Result<Job, MutationError> {
        self.mutations.cancel(&job.id).await
    }

    pub async fn retry(&self, job: &Job) -> Result<Job, MutationError> {
        self.mutations.retry(&job.id).await
    }

    /// Jobs still pending or processing on the current page.
    pub fn active_count(&self) -> usize {
        self.list
            .fetch_state()
            .results()
            .iter()
            .filter(|job| job.status.is_active())
            .count()
    }
}

impl Deref for JobsView {
    type Target = ListView<Jobs>;

    fn deref(&self) -> &Self::Target {
        &self.list
    }
}
