pub mod config;
pub mod handlers;
pub mod hooks;
pub mod models;
pub mod query;
pub mod selection;
pub mod services;
pub mod startup;
pub mod views;

use config::ListSettings;
use hooks::{Confirm, DocumentMutations, JobMutations, PreConfirmed};
use services::{DashboardApi, QueryCache, ToastCenter};
use std::sync::Arc;
use views::DashboardContext;

/// Shared application state for the HTTP surface.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn DashboardApi>,
    pub cache: Arc<QueryCache>,
    pub notifier: Arc<ToastCenter>,
    pub documents: Arc<DocumentMutations>,
    pub jobs: Arc<JobMutations>,
    pub list: ListSettings,
}

impl AppState {
    /// Destructive routes carry their own `confirm=true`, so the mutation
    /// hooks here never prompt.
    pub fn new(api: Arc<dyn DashboardApi>, notifier: Arc<ToastCenter>, list: ListSettings) -> Self {
        let cache = Arc::new(QueryCache::new(list.stale_after()).with_gc_after(list.gc_after()));
        let confirm: Arc<dyn Confirm> = Arc::new(PreConfirmed);

        let documents = Arc::new(DocumentMutations::shared(
            Arc::clone(&api),
            Arc::clone(&cache),
            notifier.clone(),
            Arc::clone(&confirm),
        ));
        let jobs = Arc::new(JobMutations::shared(
            Arc::clone(&api),
            Arc::clone(&cache),
            notifier.clone(),
            confirm,
        ));

        Self {
            api,
            cache,
            notifier,
            documents,
            jobs,
            list,
        }
    }

    /// Context for building interactive list views on top of this state.
    pub fn context(&self, confirm: Arc<dyn Confirm>) -> DashboardContext {
        DashboardContext {
            api: Arc::clone(&self.api),
            cache: Arc::clone(&self.cache),
            notifier: self.notifier.clone(),
            confirm,
            list: self.list.clone(),
        }
    }
}
