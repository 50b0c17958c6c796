#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use dashboard_frontend::config::ListSettings;
use dashboard_frontend::hooks::Confirm;
use dashboard_frontend::models::{
    Document, DocumentStatus, DocumentUpdate, DownloadLink, IngestRequest, Job, JobCreate,
    JobSource, JobStatus, JobType, JobUpdate, ListResult, Metadata, ParseJobRequest,
    UploadRequest,
};
use dashboard_frontend::query::{DocumentFilters, JobFilters, QueryParams};
use dashboard_frontend::services::{ApiError, DashboardApi, QueryCache, ToastCenter};
use dashboard_frontend::views::DashboardContext;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn document(id: &str, name: &str, status: DocumentStatus) -> Document {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    Document {
        id: id.to_string(),
        user_id: "user-1".to_string(),
        name: name.to_string(),
        original_name: format!("{}.pdf", name),
        mime_type: "application/pdf".to_string(),
        size: 1024,
        storage_key: format!("docs/{}", id),
        status,
        project_id: None,
        metadata: Metadata::new(),
        created_at: at,
        updated_at: at,
    }
}

pub fn job(id: &str, status: JobStatus, job_type: JobType) -> Job {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    Job {
        id: id.to_string(),
        user_id: "user-1".to_string(),
        document_id: Some("doc-1".to_string()),
        job_type,
        status,
        source: JobSource::Upload,
        project_id: None,
        metadata: Metadata::new(),
        options: Metadata::new(),
        error: None,
        attempts: 0,
        max_attempts: 3,
        progress: 0.0,
        created_at: at,
        updated_at: at,
        started_at: None,
        completed_at: None,
    }
}

/// In-memory backend that records every call it receives.
#[derive(Default)]
pub struct FakeApi {
    pub documents: Mutex<Vec<Document>>,
    pub jobs: Mutex<Vec<Job>>,
    pub document_requests: Mutex<Vec<QueryParams<DocumentFilters>>>,
    pub job_requests: Mutex<Vec<QueryParams<JobFilters>>>,
    pub calls: Mutex<Vec<String>>,
    /// Delay applied to successive list calls, first in first out.
    pub list_delays: Mutex<VecDeque<Duration>>,
    /// Delay applied to every start/cancel/retry call.
    pub action_delay: Mutex<Option<Duration>>,
    pub failure: Mutex<Option<ApiError>>,
}

impl FakeApi {
    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            documents: Mutex::new(documents),
            ..Self::default()
        }
    }

    pub fn with_jobs(jobs: Vec<Job>) -> Self {
        Self {
            jobs: Mutex::new(jobs),
            ..Self::default()
        }
    }

    pub fn fail_with(&self, err: ApiError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    pub fn document_list_calls(&self) -> usize {
        self.document_requests.lock().unwrap().len()
    }

    pub fn last_document_request(&self) -> Option<QueryParams<DocumentFilters>> {
        self.document_requests.lock().unwrap().last().cloned()
    }

    pub fn job_list_calls(&self) -> usize {
        self.job_requests.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls whose name starts with `prefix`, e.g. `get_job`.
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    pub fn set_job_status(&self, id: &str, status: JobStatus) {
        if let Some(job) = self.jobs.lock().unwrap().iter_mut().find(|job| job.id == id) {
            job.status = status;
        }
    }

    fn record(&self, call: String) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call);
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn action_delay(&self) {
        let delay = *self.action_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    async fn list_delay(&self) {
        let delay = self.list_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn update_job_status(&self, id: &str, status: JobStatus) -> Result<Job, ApiError> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .iter_mut()
            .find(|job| job.id == id)
            .ok_or_else(|| not_found(id))?;
        job.status = status;
        Ok(job.clone())
    }
}

fn not_found(id: &str) -> ApiError {
    ApiError::new("NOT_FOUND", 404, format!("{} not found", id))
}

fn page<T: Clone>(items: Vec<T>, page: u32, limit: u32) -> ListResult<T> {
    let total = items.len() as u64;
    let skip = (page.saturating_sub(1) * limit) as usize;
    ListResult {
        results: items.into_iter().skip(skip).take(limit as usize).collect(),
        total,
    }
}

#[async_trait]
impl DashboardApi for FakeApi {
    async fn list_documents(
        &self,
        params: &QueryParams<DocumentFilters>,
    ) -> Result<ListResult<Document>, ApiError> {
        self.document_requests.lock().unwrap().push(params.clone());
        self.list_delay().await;
        self.record("list_documents".to_string())?;

        let search = params.search.as_deref().map(str::to_lowercase);
        let matching: Vec<Document> = self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|doc| params.filters.status.value().map_or(true, |s| *s == doc.status))
            .filter(|doc| {
                params
                    .filters
                    .mime_type
                    .value()
                    .map_or(true, |m| *m == doc.mime_type)
            })
            .filter(|doc| {
                search
                    .as_ref()
                    .map_or(true, |term| doc.name.to_lowercase().contains(term))
            })
            .cloned()
            .collect();
        Ok(page(matching, params.page, params.limit))
    }

    async fn get_document(&self, id: &str) -> Result<Document, ApiError> {
        self.record(format!("get_document:{}", id))?;
        self.documents
            .lock()
            .unwrap()
            .iter()
            .find(|doc| doc.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn upload_document(&self, upload: UploadRequest) -> Result<Document, ApiError> {
        self.record(format!("upload_document:{}", upload.file_name))?;
        let mut documents = self.documents.lock().unwrap();
        let id = format!("{}", documents.len() + 1);
        let name = upload.name.unwrap_or(upload.file_name);
        let created = document(&id, &name, DocumentStatus::Uploading);
        documents.push(created.clone());
        Ok(created)
    }

    async fn ingest_document(&self, request: &IngestRequest) -> Result<Document, ApiError> {
        self.record(format!("ingest_document:{}", request.url))?;
        let mut documents = self.documents.lock().unwrap();
        let id = format!("{}", documents.len() + 1);
        let name = request.name.clone().unwrap_or_else(|| request.url.clone());
        let created = document(&id, &name, DocumentStatus::Processing);
        documents.push(created.clone());
        Ok(created)
    }

    async fn update_document(
        &self,
        id: &str,
        update: &DocumentUpdate,
    ) -> Result<Document, ApiError> {
        self.record(format!("update_document:{}", id))?;
        let mut documents = self.documents.lock().unwrap();
        let doc = documents
            .iter_mut()
            .find(|doc| doc.id == id)
            .ok_or_else(|| not_found(id))?;
        if let Some(name) = &update.name {
            doc.name = name.clone();
        }
        Ok(doc.clone())
    }

    async fn delete_document(&self, id: &str) -> Result<(), ApiError> {
        self.record(format!("delete_document:{}", id))?;
        self.documents.lock().unwrap().retain(|doc| doc.id != id);
        Ok(())
    }

    async fn download_link(&self, id: &str) -> Result<DownloadLink, ApiError> {
        self.record(format!("download_link:{}", id))?;
        Ok(DownloadLink {
            download_url: format!("https://files.example.com/{}", id),
            expires_at: None,
        })
    }

    async fn list_jobs(&self, params: &QueryParams<JobFilters>) -> Result<ListResult<Job>, ApiError> {
        self.job_requests.lock().unwrap().push(params.clone());
        self.list_delay().await;
        self.record("list_jobs".to_string())?;

        let matching: Vec<Job> = self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|job| params.filters.status.value().map_or(true, |s| *s == job.status))
            .filter(|job| {
                params
                    .filters
                    .job_type
                    .value()
                    .map_or(true, |t| *t == job.job_type)
            })
            .cloned()
            .collect();
        Ok(page(matching, params.page, params.limit))
    }

    async fn get_job(&self, id: &str) -> Result<Job, ApiError> {
        self.record(format!("get_job:{}", id))?;
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .find(|job| job.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn create_job(&self, request: &JobCreate) -> Result<Job, ApiError> {
        self.record(format!("create_job:{}", request.document_id))?;
        let mut jobs = self.jobs.lock().unwrap();
        let created = job(
            &format!("job-{}", jobs.len() + 1),
            JobStatus::Pending,
            request.job_type,
        );
        jobs.push(created.clone());
        Ok(created)
    }

    async fn update_job(&self, id: &str, _update: &JobUpdate) -> Result<Job, ApiError> {
        self.record(format!("update_job:{}", id))?;
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .find(|job| job.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn delete_job(&self, id: &str) -> Result<(), ApiError> {
        self.record(format!("delete_job:{}", id))?;
        self.jobs.lock().unwrap().retain(|job| job.id != id);
        Ok(())
    }

    async fn start_job(&self, id: &str) -> Result<Job, ApiError> {
        self.action_delay().await;
        self.record(format!("start_job:{}", id))?;
        self.update_job_status(id, JobStatus::Processing)
    }

    async fn cancel_job(&self, id: &str) -> Result<Job, ApiError> {
        self.action_delay().await;
        self.record(format!("cancel_job:{}", id))?;
        self.update_job_status(id, JobStatus::Cancelled)
    }

    async fn retry_job(&self, id: &str) -> Result<Job, ApiError> {
        self.action_delay().await;
        self.record(format!("retry_job:{}", id))?;
        self.update_job_status(id, JobStatus::Pending)
    }

    async fn submit_parse_job(&self, request: &ParseJobRequest) -> Result<Job, ApiError> {
        self.record(format!("submit_parse_job:{}", request.document_id))?;
        let mut jobs = self.jobs.lock().unwrap();
        let created = job(
            &format!("job-{}", jobs.len() + 1),
            JobStatus::Pending,
            JobType::ParseDocument,
        );
        jobs.push(created.clone());
        Ok(created)
    }
}

/// Answers every prompt the same way and remembers what was asked.
pub struct RecordingConfirm {
    answer: bool,
    pub prompts: Mutex<Vec<String>>,
}

impl RecordingConfirm {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Confirm for RecordingConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer
    }
}

pub struct Harness {
    pub api: Arc<FakeApi>,
    pub confirm: Arc<RecordingConfirm>,
    pub toasts: Arc<ToastCenter>,
    pub context: DashboardContext,
}

pub fn harness(api: FakeApi, confirm_answer: bool) -> Harness {
    let api = Arc::new(api);
    let confirm = Arc::new(RecordingConfirm::answering(confirm_answer));
    let toasts = Arc::new(ToastCenter::default());
    let list = ListSettings::default();

    let context = DashboardContext {
        api: api.clone(),
        cache: Arc::new(QueryCache::new(list.stale_after()).with_gc_after(list.gc_after())),
        notifier: toasts.clone(),
        confirm: confirm.clone(),
        list,
    };

    Harness {
        api,
        confirm,
        toasts,
        context,
    }
}

/// Let spawned tasks run until they block again.
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}
