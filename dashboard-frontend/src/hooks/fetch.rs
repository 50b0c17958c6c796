//! List fetch hook: keeps a [`FetchState`] in step with the query params.

use crate::models::ListResult;
use crate::query::QueryParams;
use crate::services::{ApiError, DashboardApi, ListResource, QueryCache, QueryKey};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct FetchState<T> {
    pub data: Option<ListResult<T>>,
    pub is_loading: bool,
    pub error: Option<ApiError>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: false,
            error: None,
        }
    }
}

impl<T> FetchState<T> {
    pub fn results(&self) -> &[T] {
        self.data
            .as_ref()
            .map(|data| data.results.as_slice())
            .unwrap_or_default()
    }

    pub fn total(&self) -> u64 {
        self.data.as_ref().map_or(0, |data| data.total)
    }
}

/// Read through the cache: a fresh hit is returned without a request,
/// otherwise the list is fetched and stored.
pub async fn fetch_cached<R: ListResource>(
    api: &dyn DashboardApi,
    cache: &QueryCache,
    params: &QueryParams<R::Filters>,
) -> Result<ListResult<R::Item>, ApiError> {
    let key = R::list_key(params);
    if let Some(hit) = cache.get_fresh::<ListResult<R::Item>>(&key) {
        tracing::debug!(key = %key, "List served from cache");
        return Ok(hit);
    }

    let list = R::fetch(api, params).await?;
    cache.set(key, list.clone());
    Ok(list)
}

/// Background task that re-requests the list whenever the memoised params
/// change, on `refetch()`, and when the resource's cache keys are
/// invalidated.
///
/// Requests may overlap. Each carries a generation number and only the
/// response to the latest request is applied, so a slow stale response can
/// never overwrite newer data. Errors are surfaced, never retried.
pub struct ListFetcher<R: ListResource> {
    state: watch::Receiver<FetchState<R::Item>>,
    refetch: mpsc::UnboundedSender<()>,
    task: JoinHandle<()>,
}

impl<R: ListResource> ListFetcher<R> {
    pub fn spawn(
        api: Arc<dyn DashboardApi>,
        cache: Arc<QueryCache>,
        params: watch::Receiver<QueryParams<R::Filters>>,
    ) -> Self {
        let (state_tx, state) = watch::channel(FetchState {
            is_loading: true,
            ..FetchState::default()
        });
        let (refetch, refetch_rx) = mpsc::unbounded_channel();
        let invalidations = cache.subscribe();

        let driver = Driver::<R> {
            api,
            cache,
            params,
            state: state_tx,
            generation: 0,
            last_params: None,
        };
        let task = tokio::spawn(driver.run(refetch_rx, invalidations));

        Self {
            state,
            refetch,
            task,
        }
    }

    pub fn state(&self) -> FetchState<R::Item> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState<R::Item>> {
        self.state.clone()
    }

    /// Re-request the current params, bypassing the cache.
    pub fn refetch(&self) {
        let _ = self.refetch.send(());
    }
}

impl<R: ListResource> Drop for ListFetcher<R> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

type Completion<T> = (u64, QueryKey, Result<ListResult<T>, ApiError>);

struct Driver<R: ListResource> {
    api: Arc<dyn DashboardApi>,
    cache: Arc<QueryCache>,
    params: watch::Receiver<QueryParams<R::Filters>>,
    state: watch::Sender<FetchState<R::Item>>,
    generation: u64,
    last_params: Option<QueryParams<R::Filters>>,
}

impl<R: ListResource> Driver<R> {
    async fn run(
        mut self,
        mut refetch: mpsc::UnboundedReceiver<()>,
        mut invalidations: broadcast::Receiver<QueryKey>,
    ) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion<R::Item>>();
        self.start(false, &done_tx);

        loop {
            tokio::select! {
                changed = self.params.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.start(false, &done_tx);
                }
                Some(()) = refetch.recv() => self.start(true, &done_tx),
                invalidated = invalidations.recv() => match invalidated {
                    Ok(prefix) => {
                        let watching = self
                            .last_params
                            .as_ref()
                            .map(R::list_key)
                            .is_some_and(|key| key.starts_with(&prefix));
                        if watching {
                            self.start(true, &done_tx);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, resource = R::ROOT, "Missed cache invalidations, refetching");
                        self.start(true, &done_tx);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                Some((generation, key, result)) = done_rx.recv() => {
                    self.finish(generation, key, result);
                }
            }
        }
    }

    fn start(&mut self, force: bool, done: &mpsc::UnboundedSender<Completion<R::Item>>) {
        let params = self.params.borrow_and_update().clone();
        if !force && self.last_params.as_ref() == Some(&params) {
            return;
        }
        self.last_params = Some(params.clone());
        self.generation += 1;
        let generation = self.generation;
        let key = R::list_key(&params);

        if !force {
            if let Some(hit) = self.cache.get_fresh::<ListResult<R::Item>>(&key) {
                tracing::debug!(key = %key, "List served from cache");
                self.state.send_replace(FetchState {
                    data: Some(hit),
                    is_loading: false,
                    error: None,
                });
                return;
            }
        }

        tracing::debug!(key = %key, generation, "Fetching list");
        self.state.send_modify(|state| state.is_loading = true);

        let api = Arc::clone(&self.api);
        let done = done.clone();
        tokio::spawn(async move {
            let result = R::fetch(api.as_ref(), &params).await;
            let _ = done.send((generation, key, result));
        });
    }

    fn finish(
        &mut self,
        generation: u64,
        key: QueryKey,
        result: Result<ListResult<R::Item>, ApiError>,
    ) {
        if generation != self.generation {
            tracing::debug!(
                key = %key,
                generation,
                latest = self.generation,
                "Dropping stale list response"
            );
            return;
        }

        match result {
            Ok(list) => {
                self.cache.set(key, list.clone());
                self.state.send_replace(FetchState {
                    data: Some(list),
                    is_loading: false,
                    error: None,
                });
            }
            Err(err) => {
                tracing::warn!(
                    key = %key,
                    code = %err.code,
                    status = err.status,
                    "List fetch failed"
                );
                self.state.send_modify(|state| {
                    state.is_loading = false;
                    state.error = Some(err);
                });
            }
        }
    }
}
