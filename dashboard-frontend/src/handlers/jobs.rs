use super::{load_list_page, ConfirmParams, ListPage};
use crate::hooks::fetch_job_cached;
use crate::models::Job;
use crate::query::JobFilters;
use crate::services::Jobs;
use crate::AppState;
use axum::{
    extract::{Path, Query, RawQuery, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

pub async fn list_jobs(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<ListPage<JobFilters, Job>>, AppError> {
    let page = load_list_page::<Jobs>(&state, query.as_deref()).await?;
    Ok(Json(page))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Job>, AppError> {
    let stale_after = state.list.job_polling().stale_after;
    let job = fetch_job_cached(state.api.as_ref(), &state.cache, &id, stale_after).await?;
    Ok(Json(job))
}

pub async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ConfirmParams>,
) -> Result<StatusCode, AppError> {
    params.require()?;
    state.jobs.delete_confirmed(&id).await?;
    tracing::info!(job_id = %id, "Job deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn start_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Job>, AppError> {
    Ok(Json(state.jobs.start(&id).await?))
}

pub async fn cancel_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Job>, AppError> {
    Ok(Json(state.jobs.cancel(&id).await?))
}

pub async fn retry_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Job>, AppError> {
    Ok(Json(state.jobs.retry(&id).await?))
}
