//! List pages: query state, fetch, selection and mutations wired together.
pub mod documents;
pub mod jobs;

pub use documents::DocumentsView;
pub use jobs::JobsView;

use crate::config::ListSettings;
use crate::hooks::{Confirm, FetchState, ListFetcher};
use crate::models::Identified;
use crate::query::{ListQuery, Location, QueryParams, QueryState};
use crate::selection::SelectionSet;
use crate::services::{DashboardApi, ListResource, Notifier, QueryCache};
use std::sync::Arc;
use tokio::sync::watch;

/// Everything a list page needs from the application.
#[derive(Clone)]
pub struct DashboardContext {
    pub api: Arc<dyn DashboardApi>,
    pub cache: Arc<QueryCache>,
    pub notifier: Arc<dyn Notifier>,
    pub confirm: Arc<dyn Confirm>,
    pub list: ListSettings,
}

/// The resource-independent half of a list page.
///
/// Any change to search, filters or page clears the selection.
pub struct ListView<R: ListResource> {
    query: ListQuery<R::Filters>,
    fetcher: ListFetcher<R>,
    selection: watch::Sender<SelectionSet>,
}

impl<R> ListView<R>
where
    R: ListResource,
    R::Item: Identified,
{
    pub fn new(context: &DashboardContext, location: Arc<dyn Location>) -> Self {
        let query = ListQuery::new(
            location,
            context.list.page_size,
            context.list.search_debounce(),
        );
        let fetcher = ListFetcher::spawn(
            Arc::clone(&context.api),
            Arc::clone(&context.cache),
            query.subscribe(),
        );

        Self {
            query,
            fetcher,
            selection: watch::channel(SelectionSet::new()).0,
        }
    }

    pub fn query(&self) -> &ListQuery<R::Filters> {
        &self.query
    }

    pub fn query_state(&self) -> QueryState<R::Filters> {
        self.query.state()
    }

    pub fn params(&self) -> QueryParams<R::Filters> {
        self.query.params()
    }

    pub fn fetch_state(&self) -> FetchState<R::Item> {
        self.fetcher.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState<R::Item>> {
        self.fetcher.subscribe()
    }

    /// Ids of the rows currently on screen.
    pub fn loaded_ids(&self) -> Vec<String> {
        self.fetcher
            .state()
            .results()
            .iter()
            .map(|item| item.id().to_string())
            .collect()
    }

    pub fn total_pages(&self) -> u64 {
        self.fetcher
            .state()
            .data
            .map_or(0, |data| data.total_pages(self.query.limit()))
    }

    pub fn set_search(&self, term: impl Into<String>) {
        self.query.set_search(term);
        self.clear_selection();
    }

    pub fn update_filters(&self, change: impl FnOnce(&mut R::Filters)) {
        self.query.update_filters(change);
        self.clear_selection();
    }

    pub fn set_page(&self, page: u32) {
        self.query.set_page(page);
        self.clear_selection();
    }

    pub fn clear_filters(&self) {
        self.query.clear_filters();
        self.clear_selection();
    }

    pub fn refresh(&self) {
        self.fetcher.refetch();
    }

    pub fn toggle_selection(&self, id: &str) {
        let loaded = self.loaded_ids();
        self.selection
            .send_modify(|selection| selection.toggle(id, &loaded));
    }

    pub fn select_all(&self) {
        let loaded = self.loaded_ids();
        self.selection
            .send_modify(|selection| selection.select_all(&loaded));
    }

    pub fn is_all_selected(&self) -> bool {
        let loaded = self.loaded_ids();
        self.selection.borrow().is_all_selected(&loaded)
    }

    /// Selected ids that are still loaded; rows that disappeared after a
    /// refetch are dropped from the selection first.
    pub fn selected(&self) -> Vec<String> {
        let loaded = self.loaded_ids();
        self.selection.send_modify(|selection| selection.sync(&loaded));
        self.selection.borrow().ids()
    }

    pub fn subscribe_selection(&self) -> watch::Receiver<SelectionSet> {
        self.selection.subscribe()
    }

    pub fn clear_selection(&self) {
        self.selection.send_if_modified(|selection| {
            if selection.is_empty() {
                false
            } else {
                selection.clear();
                true
            }
        });
    }

    /// Loaded row with the given id.
    pub fn find(&self, id: &str) -> Option<R::Item> {
        self.fetcher
            .state()
            .results()
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }
}
