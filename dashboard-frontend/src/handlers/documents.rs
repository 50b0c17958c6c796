use super::{load_list_page, ConfirmParams, ListPage};
use crate::models::{Document, DownloadLink};
use crate::query::DocumentFilters;
use crate::services::Documents;
use crate::AppState;
use axum::{
    extract::{Path, Query, RawQuery, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

pub async fn list_documents(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<ListPage<DocumentFilters, Document>>, AppError> {
    let page = load_list_page::<Documents>(&state, query.as_deref()).await?;
    Ok(Json(page))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ConfirmParams>,
) -> Result<StatusCode, AppError> {
    params.require()?;
    state.documents.delete_confirmed(&id).await?;
    tracing::info!(document_id = %id, "Document deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn download_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DownloadLink>, AppError> {
    let link = state.documents.download(&id).await?;
    Ok(Json(link))
}
