use super::debounce::Debouncer;
use super::filter::ListFilters;
use super::params::{QueryParams, QueryState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Read/write access to the query-string part of the address bar.
pub trait Location: Send + Sync {
    /// Current query string, without the leading `?`.
    fn query_string(&self) -> String;

    /// Replace the query string in place (no new history entry).
    fn replace_query(&self, query: &str);
}

/// In-process location, used when the list state is driven server-side or
/// from tests.
pub struct MemoryLocation {
    current: watch::Sender<String>,
}

impl MemoryLocation {
    pub fn new(initial: impl Into<String>) -> Self {
        let initial = initial.into();
        let initial = initial.strip_prefix('?').unwrap_or(&initial).to_string();
        Self {
            current: watch::channel(initial).0,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.current.subscribe()
    }
}

impl Location for MemoryLocation {
    fn query_string(&self) -> String {
        self.current.borrow().clone()
    }

    fn replace_query(&self, query: &str) {
        let query = query.strip_prefix('?').unwrap_or(query);
        self.current.send_if_modified(|current| {
            if current == query {
                false
            } else {
                *current = query.to_string();
                true
            }
        });
    }
}

struct Shared<F> {
    state: watch::Sender<QueryState<F>>,
    params: watch::Sender<QueryParams<F>>,
    limit: u32,
}

impl<F: ListFilters> Shared<F> {
    /// Derive request parameters from the current state and the settled
    /// search term; subscribers are woken only on an actual change.
    fn recompute(&self, search: &str) {
        let next = self.state.borrow().to_params(self.limit, search);
        self.params.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

/// Search, filter and page state of one list view, kept in sync with the
/// URL.
///
/// Every setter resets the page to 1 (except `set_page`) and rewrites the
/// query string immediately. The search term reaches the request
/// parameters only after it has settled for the debounce delay.
pub struct ListQuery<F: ListFilters> {
    shared: Arc<Shared<F>>,
    search: Debouncer<String>,
    location: Arc<dyn Location>,
    driver: JoinHandle<()>,
}

impl<F: ListFilters> ListQuery<F> {
    /// Hydrate from the location's current query string. Must be called
    /// inside a tokio runtime.
    pub fn new(location: Arc<dyn Location>, limit: u32, debounce: Duration) -> Self {
        let initial = QueryState::<F>::from_query_string(&location.query_string());
        let params = initial.to_params(limit, &initial.search);
        let search = Debouncer::new(initial.search.clone(), debounce);

        tracing::debug!(
            query = %initial.to_query_string(),
            page = initial.page,
            "List query hydrated from URL"
        );

        let shared = Arc::new(Shared {
            state: watch::channel(initial).0,
            params: watch::channel(params).0,
            limit,
        });

        let mut settled = search.subscribe();
        let driver_shared = Arc::clone(&shared);
        let driver = tokio::spawn(async move {
            while settled.changed().await.is_ok() {
                let term = settled.borrow_and_update().clone();
                driver_shared.recompute(&term);
            }
        });

        Self {
            shared,
            search,
            location,
            driver,
        }
    }

    pub fn state(&self) -> QueryState<F> {
        self.shared.state.borrow().clone()
    }

    pub fn params(&self) -> QueryParams<F> {
        self.shared.params.borrow().clone()
    }

    /// Memoised request parameters; changes only when a value differs.
    pub fn subscribe(&self) -> watch::Receiver<QueryParams<F>> {
        self.shared.params.subscribe()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<QueryState<F>> {
        self.shared.state.subscribe()
    }

    pub fn limit(&self) -> u32 {
        self.shared.limit
    }

    pub fn query_string(&self) -> String {
        self.shared.state.borrow().to_query_string()
    }

    pub fn set_search(&self, term: impl Into<String>) {
        let term = term.into();
        self.update(|state| {
            state.search = term.clone();
            state.page = 1;
        });
        self.search.set(term);
    }

    pub fn update_filters(&self, change: impl FnOnce(&mut F)) {
        self.update(|state| {
            change(&mut state.filters);
            state.page = 1;
        });
    }

    pub fn set_page(&self, page: u32) {
        self.update(|state| state.page = page.max(1));
    }

    /// Reset every axis and drop the whole query string, foreign keys
    /// included. The cleared search applies without waiting.
    pub fn clear_filters(&self) {
        self.shared.state.send_replace(QueryState::default());
        self.location.replace_query("");
        self.search.flush(String::new());
        self.shared.recompute("");
    }

    fn update(&self, change: impl FnOnce(&mut QueryState<F>)) {
        self.shared.state.send_modify(change);
        let query = self.shared.state.borrow().to_query_string();
        self.location.replace_query(&query);
        self.shared.recompute(&self.search.current());
    }
}

impl<F: ListFilters> Drop for ListQuery<F> {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentStatus;
    use crate::query::filter::{DocumentFilters, Filter};
    use tokio::time::sleep;

    const DEBOUNCE: Duration = Duration::from_millis(300);

    fn setup(url: &str) -> (Arc<MemoryLocation>, ListQuery<DocumentFilters>) {
        let location = Arc::new(MemoryLocation::new(url));
        let query = ListQuery::new(location.clone(), 20, DEBOUNCE);
        (location, query)
    }

    #[tokio::test]
    async fn hydrates_from_shared_link() {
        let (_, query) = setup("?search=tax&status=failed&page=4");

        let state = query.state();
        assert_eq!(state.search, "tax");
        assert_eq!(state.filters.status, Filter::Only(DocumentStatus::Failed));
        assert_eq!(state.page, 4);

        let params = query.params();
        assert_eq!(params.search.as_deref(), Some("tax"));
        assert_eq!(params.page, 4);
    }

    #[tokio::test]
    async fn filter_change_resets_page_and_rewrites_url() {
        let (location, query) = setup("page=3");

        query.update_filters(|f| f.mime_type = Filter::Only("image/png".into()));

        assert_eq!(query.state().page, 1);
        assert_eq!(location.query_string(), "mime_type=image%2Fpng");
        assert_eq!(query.params().page, 1);
    }

    #[tokio::test]
    async fn every_setter_resets_page() {
        let (_, query) = setup("");
        let setters: Vec<Box<dyn Fn(&ListQuery<DocumentFilters>)>> = vec![
            Box::new(|q| q.set_search("x")),
            Box::new(|q| q.update_filters(|f| f.status = Filter::Only(DocumentStatus::Completed))),
            Box::new(|q| q.update_filters(|f| f.mime_type = Filter::Only("text/csv".into()))),
            Box::new(|q| q.update_filters(|f| f.project_id = Filter::Only("p-1".into()))),
            Box::new(|q| q.clear_filters()),
        ];

        for setter in setters {
            query.set_page(5);
            assert_eq!(query.state().page, 5);
            setter(&query);
            assert_eq!(query.state().page, 1);
        }
    }

    #[tokio::test]
    async fn clearing_filters_empties_the_url() {
        let (location, query) = setup("search=a&status=completed&project_id=p&page=2&tab=x");
        query.clear_filters();

        assert_eq!(location.query_string(), "");
        assert_eq!(query.params(), QueryParams::first_page(20));
    }

    #[tokio::test(start_paused = true)]
    async fn search_reaches_params_only_after_debounce() {
        let (location, query) = setup("");
        let mut params = query.subscribe();

        query.set_search("inv");
        assert_eq!(location.query_string(), "search=inv");
        assert_eq!(query.params().search, None);

        sleep(Duration::from_millis(310)).await;
        assert!(params.has_changed().unwrap());
        assert_eq!(params.borrow_and_update().search.as_deref(), Some("inv"));
    }

    #[tokio::test]
    async fn set_page_clamps_to_first_page() {
        let (location, query) = setup("");
        query.set_page(0);
        assert_eq!(query.state().page, 1);
        assert_eq!(location.query_string(), "");

        query.set_page(2);
        assert_eq!(location.query_string(), "page=2");
    }
}
