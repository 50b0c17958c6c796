//! `reqwest` implementation of [`DashboardApi`] for the `/v1` REST API.

use super::api::DashboardApi;
use super::error::ApiError;
use crate::config::ApiSettings;
use crate::models::{
    Document, DocumentUpdate, DownloadLink, IngestRequest, Job, JobCreate, JobUpdate, ListResult,
    ParseJobRequest, UploadRequest,
};
use crate::query::{DocumentFilters, JobFilters, QueryParams};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use service_core::observability::inject_trace_headers;
use service_core::observability::trace_context::extract_request_id;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub struct HttpDashboardApi {
    client: Client,
    settings: ApiSettings,
}

impl HttpDashboardApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ApiError::network(&settings.base_url, e))?;

        Ok(Self { client, settings })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    /// `{collection}/{id}{suffix}` with the id percent-encoded as one path
    /// segment, so an id can never address another resource.
    fn item_url(&self, collection: &str, id: &str, suffix: &str) -> Result<String, ApiError> {
        if id.is_empty() || id == "." || id == ".." {
            tracing::warn!(collection, id, "Refusing request for an invalid id");
            return Err(ApiError::new(
                "VALIDATION_ERROR",
                400,
                format!("Invalid resource id '{}'", id),
            ));
        }
        Ok(self.url(&format!(
            "{}/{}{}",
            collection,
            urlencoding::encode(id),
            suffix
        )))
    }

    /// Send with auth, correlation id and trace headers. Non-2xx responses
    /// become [`ApiError`]s built from the error body.
    async fn execute(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let request_id = Uuid::new_v4().to_string();
        let mut headers = HeaderMap::new();
        inject_trace_headers(&mut headers, &request_id);

        let started = Instant::now();
        let response = request
            .headers(headers)
            .bearer_auth(self.settings.token.expose_secret())
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(endpoint, request_id = %request_id, error = %e, "API request failed");
                if e.is_timeout() {
                    ApiError::timeout(endpoint)
                } else {
                    ApiError::network(endpoint, e)
                }
            })?;

        let status = response.status();
        tracing::debug!(
            endpoint,
            request_id = %request_id,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "API request completed"
        );

        if status.is_success() {
            return Ok(response);
        }

        let returned_id = extract_request_id(response.headers()).or(Some(request_id));
        let body = response.bytes().await.unwrap_or_default();
        let err = ApiError::from_response(status.as_u16(), &body, returned_id, endpoint);

        tracing::warn!(
            endpoint,
            status = err.status,
            code = %err.code,
            request_id = ?err.request_id,
            "API returned an error"
        );
        Err(err)
    }

    async fn json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> Result<T, ApiError> {
        let response = self.execute(request, endpoint).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::network(endpoint, e))?;

        serde_json::from_slice(&body).map_err(|e| {
            tracing::error!(endpoint, error = %e, "Failed to decode API response");
            ApiError::decode(endpoint, e)
        })
    }

    async fn empty(&self, request: RequestBuilder, endpoint: &str) -> Result<(), ApiError> {
        self.execute(request, endpoint).await.map(|_| ())
    }
}

#[async_trait]
impl DashboardApi for HttpDashboardApi {
    async fn list_documents(
        &self,
        params: &QueryParams<DocumentFilters>,
    ) -> Result<ListResult<Document>, ApiError> {
        let request = self
            .client
            .get(self.url("/v1/documents"))
            .query(&params.to_pairs());
        self.json(request, "GET /v1/documents").await
    }

    async fn get_document(&self, id: &str) -> Result<Document, ApiError> {
        let request = self.client.get(self.item_url("/v1/documents", id, "")?);
        self.json(request, "GET /v1/documents/{id}").await
    }

    async fn upload_document(&self, upload: UploadRequest) -> Result<Document, ApiError> {
        let endpoint = "POST /v1/documents";
        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.content_type)
            .map_err(|e| ApiError::new("VALIDATION_ERROR", 400, format!("Invalid content type: {}", e)))?;

        let mut form = Form::new().part("file", part);
        if let Some(name) = upload.name {
            form = form.text("name", name);
        }
        if let Some(project_id) = upload.project_id {
            form = form.text("projectId", project_id);
        }

        let request = self.client.post(self.url("/v1/documents")).multipart(form);
        self.json(request, endpoint).await
    }

    async fn ingest_document(&self, request: &IngestRequest) -> Result<Document, ApiError> {
        let request = self
            .client
            .post(self.url("/v1/documents/ingest"))
            .json(request);
        self.json(request, "POST /v1/documents/ingest").await
    }

    async fn update_document(
        &self,
        id: &str,
        update: &DocumentUpdate,
    ) -> Result<Document, ApiError> {
        let request = self
            .client
            .patch(self.item_url("/v1/documents", id, "")?)
            .json(update);
        self.json(request, "PATCH /v1/documents/{id}").await
    }

    async fn delete_document(&self, id: &str) -> Result<(), ApiError> {
        let request = self.client.delete(self.item_url("/v1/documents", id, "")?);
        self.empty(request, "DELETE /v1/documents/{id}").await
    }

    async fn download_link(&self, id: &str) -> Result<DownloadLink, ApiError> {
        let request = self
            .client
            .get(self.item_url("/v1/documents", id, "/download")?);
        self.json(request, "GET /v1/documents/{id}/download").await
    }

    async fn list_jobs(
        &self,
        params: &QueryParams<JobFilters>,
    ) -> Result<ListResult<Job>, ApiError> {
        let request = self
            .client
            .get(self.url("/v1/jobs"))
            .query(&params.to_pairs());
        self.json(request, "GET /v1/jobs").await
    }

    async fn get_job(&self, id: &str) -> Result<Job, ApiError> {
        let request = self.client.get(self.item_url("/v1/jobs", id, "")?);
        self.json(request, "GET /v1/jobs/{id}").await
    }

    async fn create_job(&self, request: &JobCreate) -> Result<Job, ApiError> {
        let request = self.client.post(self.url("/v1/jobs")).json(request);
        self.json(request, "POST /v1/jobs").await
    }

    async fn update_job(&self, id: &str, update: &JobUpdate) -> Result<Job, ApiError> {
        let request = self
            .client
            .patch(self.item_url("/v1/jobs", id, "")?)
            .json(update);
        self.json(request, "PATCH /v1/jobs/{id}").await
    }

    async fn delete_job(&self, id: &str) -> Result<(), ApiError> {
        let request = self.client.delete(self.item_url("/v1/jobs", id, "")?);
        self.empty(request, "DELETE /v1/jobs/{id}").await
    }

    async fn start_job(&self, id: &str) -> Result<Job, ApiError> {
        let request = self.client.post(self.item_url("/v1/jobs", id, "/start")?);
        self.json(request, "POST /v1/jobs/{id}/start").await
    }

    async fn cancel_job(&self, id: &str) -> Result<Job, ApiError> {
        let request = self.client.post(self.item_url("/v1/jobs", id, "/cancel")?);
        self.json(request, "POST /v1/jobs/{id}/cancel").await
    }

    async fn retry_job(&self, id: &str) -> Result<Job, ApiError> {
        let request = self.client.post(self.item_url("/v1/jobs", id, "/retry")?);
        self.json(request, "POST /v1/jobs/{id}/retry").await
    }

    async fn submit_parse_job(&self, request: &ParseJobRequest) -> Result<Job, ApiError> {
        let request = self.client.post(self.url("/v1/jobs/parse")).json(request);
        self.json(request, "POST /v1/jobs/parse").await
    }
}
