use super::mutation::{Confirm, Mutation, MutationError, MutationOutcome};
use crate::models::{Job, JobCreate, JobUpdate, ParseJobRequest};
use crate::services::{keys, DashboardApi, Notifier, QueryCache, Toast};
use std::sync::Arc;
use validator::Validate;

/// Store the authoritative job returned by the backend, then refresh lists.
fn apply_job(job: &Job, cache: &QueryCache) {
    cache.set(keys::item(keys::JOBS, &job.id), job.clone());
    cache.invalidate(&keys::lists(keys::JOBS));
}

/// CRUD plus the start/cancel/retry workflow for processing jobs.
pub struct JobMutations {
    api: Arc<dyn DashboardApi>,
    confirm: Arc<dyn Confirm>,
    creating: Mutation,
    updating: Mutation,
    deleting: Mutation,
    starting: Mutation,
    cancelling: Mutation,
    retrying: Mutation,
    parsing: Mutation,
}

impl JobMutations {
    /// Hooks for one page: each control allows one call at a time.
    pub fn new(
        api: Arc<dyn DashboardApi>,
        cache: Arc<QueryCache>,
        notifier: Arc<dyn Notifier>,
        confirm: Arc<dyn Confirm>,
    ) -> Self {
        Self::build(api, cache, notifier, confirm, true)
    }

    /// Hooks shared by every request of the HTTP surface. Concurrent calls
    /// are never refused.
    pub fn shared(
        api: Arc<dyn DashboardApi>,
        cache: Arc<QueryCache>,
        notifier: Arc<dyn Notifier>,
        confirm: Arc<dyn Confirm>,
    ) -> Self {
        Self::build(api, cache, notifier, confirm, false)
    }

    fn build(
        api: Arc<dyn DashboardApi>,
        cache: Arc<QueryCache>,
        notifier: Arc<dyn Notifier>,
        confirm: Arc<dyn Confirm>,
        gated: bool,
    ) -> Self {
        let mutation = |name, error_title| {
            let mutation =
                Mutation::new(name, error_title, Arc::clone(&cache), Arc::clone(&notifier));
            if gated {
                mutation
            } else {
                mutation.ungated()
            }
        };

        Self {
            creating: mutation("create_job", "Job creation failed"),
            updating: mutation("update_job", "Update failed"),
            deleting: mutation("delete_job", "Deletion failed"),
            starting: mutation("start_job", "Start failed"),
            cancelling: mutation("cancel_job", "Cancellation failed"),
            retrying: mutation("retry_job", "Retry failed"),
            parsing: mutation("submit_parse_job", "Job creation failed"),
            api,
            confirm,
        }
    }

    pub async fn create(&self, request: &JobCreate) -> Result<Job, MutationError> {
        if let Err(errors) = request.validate() {
            return Err(self.creating.reject(errors));
        }

        self.creating
            .trigger(self.api.create_job(request), |job, cache| {
                cache.invalidate(&keys::lists(keys::JOBS));
                Toast::success(
                    "Job created",
                    format!(
                        "Processing job \"{}\" has been created successfully.",
                        job.job_type
                    ),
                )
            })
            .await
    }

    pub async fn update(&self, id: &str, update: &JobUpdate) -> Result<Job, MutationError> {
        self.updating
            .trigger(self.api.update_job(id, update), |job, cache| {
                apply_job(job, cache);
                Toast::success("Job updated", "Job has been updated successfully.")
            })
            .await
    }

    pub async fn delete(&self, job: &Job) -> Result<MutationOutcome<()>, MutationError> {
        let prompt = format!("Are you sure you want to delete job \"{}\"?", job.id);
        if !self.confirm.confirm(&prompt).await {
            tracing::debug!(job_id = %job.id, "Deletion declined");
            return Ok(MutationOutcome::Declined);
        }
        self.delete_confirmed(&job.id)
            .await
            .map(MutationOutcome::Completed)
    }

    pub async fn delete_confirmed(&self, id: &str) -> Result<(), MutationError> {
        self.deleting
            .run(self.api.delete_job(id), |_, cache| {
                cache.remove(&keys::item(keys::JOBS, id));
                cache.invalidate(&keys::root(keys::JOBS));
                Toast::success("Job deleted", "The job has been deleted successfully.")
            })
            .await
    }

    pub async fn start(&self, id: &str) -> Result<Job, MutationError> {
        self.starting
            .trigger(self.api.start_job(id), |job, cache| {
                apply_job(job, cache);
                Toast::success(
                    "Job started",
                    "The job has been started and is now processing.",
                )
            })
            .await
    }

    pub async fn cancel(&self, id: &str) -> Result<Job, MutationError> {
        self.cancelling
            .trigger(self.api.cancel_job(id), |job, cache| {
                apply_job(job, cache);
                Toast::success("Job cancelled", "The job has been cancelled successfully.")
            })
            .await
    }

    pub async fn retry(&self, id: &str) -> Result<Job, MutationError> {
        self.retrying
            .trigger(self.api.retry_job(id), |job, cache| {
                apply_job(job, cache);
                Toast::success(
                    "Job retrying",
                    "The job has been reset and will retry processing.",
                )
            })
            .await
    }

    /// Queue a parse of an existing document.
    pub async fn submit_parse(&self, request: &ParseJobRequest) -> Result<Job, MutationError> {
        if let Err(errors) = request.validate() {
            return Err(self.parsing.reject(errors));
        }

        self.parsing
            .trigger(self.api.submit_parse_job(request), |job, cache| {
                cache.invalidate(&keys::lists(keys::JOBS));
                Toast::success(
                    "Job created",
                    format!(
                        "Processing job \"{}\" has been created successfully.",
                        job.job_type
                    ),
                )
            })
            .await
    }

    pub fn is_creating(&self) -> bool {
        self.creating.is_pending() || self.parsing.is_pending()
    }

    pub fn is_updating(&self) -> bool {
        self.updating.is_pending()
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting.is_pending()
    }

    pub fn is_starting(&self) -> bool {
        self.starting.is_pending()
    }

    pub fn is_cancelling(&self) -> bool {
        self.cancelling.is_pending()
    }

    pub fn is_retrying(&self) -> bool {
        self.retrying.is_pending()
    }
}
