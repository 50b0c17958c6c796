//! Data-access seam for the dashboard REST API.

use super::cache::{keys, QueryKey};
use super::error::ApiError;
use crate::models::{
    Document, DocumentUpdate, DownloadLink, IngestRequest, Job, JobCreate, JobUpdate, ListResult,
    ParseJobRequest, UploadRequest,
};
use crate::query::{DocumentFilters, JobFilters, ListFilters, QueryParams};
use async_trait::async_trait;
use futures::future::BoxFuture;

#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn list_documents(
        &self,
        params: &QueryParams<DocumentFilters>,
    ) -> Result<ListResult<Document>, ApiError>;

    async fn get_document(&self, id: &str) -> Result<Document, ApiError>;

    async fn upload_document(&self, upload: UploadRequest) -> Result<Document, ApiError>;

    async fn ingest_document(&self, request: &IngestRequest) -> Result<Document, ApiError>;

    async fn update_document(
        &self,
        id: &str,
        update: &DocumentUpdate,
    ) -> Result<Document, ApiError>;

    async fn delete_document(&self, id: &str) -> Result<(), ApiError>;

    async fn download_link(&self, id: &str) -> Result<DownloadLink, ApiError>;

    async fn list_jobs(&self, params: &QueryParams<JobFilters>)
        -> Result<ListResult<Job>, ApiError>;

    async fn get_job(&self, id: &str) -> Result<Job, ApiError>;

    async fn create_job(&self, request: &JobCreate) -> Result<Job, ApiError>;

    async fn update_job(&self, id: &str, update: &JobUpdate) -> Result<Job, ApiError>;

    async fn delete_job(&self, id: &str) -> Result<(), ApiError>;

    async fn start_job(&self, id: &str) -> Result<Job, ApiError>;

    async fn cancel_job(&self, id: &str) -> Result<Job, ApiError>;

    async fn retry_job(&self, id: &str) -> Result<Job, ApiError>;

    async fn submit_parse_job(&self, request: &ParseJobRequest) -> Result<Job, ApiError>;
}

/// A paginated collection the list views can show.
pub trait ListResource: Send + Sync + 'static {
    type Filters: ListFilters;
    type Item: Clone + Send + Sync + 'static;

    /// Root cache key segment; invalidating it refreshes every view of the
    /// resource.
    const ROOT: &'static str;

    fn fetch<'a>(
        api: &'a dyn DashboardApi,
        params: &'a QueryParams<Self::Filters>,
    ) -> BoxFuture<'a, Result<ListResult<Self::Item>, ApiError>>;

    fn list_key(params: &QueryParams<Self::Filters>) -> QueryKey {
        keys::list(Self::ROOT, params)
    }
}

pub struct Documents;

impl ListResource for Documents {
    type Filters = DocumentFilters;
    type Item = Document;

    const ROOT: &'static str = keys::DOCUMENTS;

    fn fetch<'a>(
        api: &'a dyn DashboardApi,
        params: &'a QueryParams<DocumentFilters>,
    ) -> BoxFuture<'a, Result<ListResult<Document>, ApiError>> {
        api.list_documents(params)
    }
}

pub struct Jobs;

impl ListResource for Jobs {
    type Filters = JobFilters;
    type Item = Job;

    const ROOT: &'static str = keys::JOBS;

    fn fetch<'a>(
        api: &'a dyn DashboardApi,
        params: &'a QueryParams<JobFilters>,
    ) -> BoxFuture<'a, Result<ListResult<Job>, ApiError>> {
        api.list_jobs(params)
    }
}
