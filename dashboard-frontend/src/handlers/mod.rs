pub mod app;
pub mod documents;
pub mod jobs;

use crate::hooks::fetch_cached;
use crate::query::{QueryParams, QueryState};
use crate::services::ListResource;
use crate::AppState;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

/// One rendered page of a list view.
#[derive(Serialize)]
#[serde(bound = "QueryParams<F>: Serialize, T: Serialize")]
pub struct ListPage<F, T> {
    /// Canonical query string for the address bar.
    pub query: String,
    pub params: QueryParams<F>,
    pub results: Vec<T>,
    pub total: u64,
    pub total_pages: u64,
    /// Whether a "clear filters" control applies.
    pub has_active_filters: bool,
}

/// Hydrate the list state from a raw query string and load its page.
///
/// The search term applies immediately; debouncing belongs to interactive
/// views, not to a request that already carries the settled term.
pub async fn load_list_page<R: ListResource>(
    state: &AppState,
    raw_query: Option<&str>,
) -> Result<ListPage<R::Filters, R::Item>, AppError>
where
    R::Item: Serialize,
{
    let query = QueryState::<R::Filters>::from_query_string(raw_query.unwrap_or_default());
    let params = query.to_params(state.list.page_size, &query.search);

    let list = fetch_cached::<R>(state.api.as_ref(), &state.cache, &params).await?;
    let total_pages = list.total_pages(params.limit);

    tracing::debug!(
        resource = R::ROOT,
        query = %query.to_query_string(),
        total = list.total,
        "List page loaded"
    );

    Ok(ListPage {
        query: query.to_query_string(),
        params,
        results: list.results,
        total: list.total,
        total_pages,
        has_active_filters: query.has_active_filters(),
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfirmParams {
    #[serde(default)]
    pub confirm: bool,
}

impl ConfirmParams {
    pub fn require(&self) -> Result<(), AppError> {
        if self.confirm {
            Ok(())
        } else {
            Err(AppError::BadRequest(anyhow::anyhow!(
                "Destructive action requires confirm=true"
            )))
        }
    }
}
