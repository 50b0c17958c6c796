use super::{DashboardContext, ListView};
use crate::hooks::{Confirm, DocumentMutations, MutationError, MutationOutcome};
use crate::models::{Document, DocumentStatus, DownloadLink};
use crate::query::{DocumentFilters, Filter, Location};
use crate::services::Documents;
use std::ops::Deref;
use std::sync::Arc;

/// The documents page.
pub struct DocumentsView {
    list: ListView<Documents>,
    mutations: DocumentMutations,
    confirm: Arc<dyn Confirm>,
}

impl DocumentsView {
    pub fn new(context: &DashboardContext, location: Arc<dyn Location>) -> Self {
        Self {
            list: ListView::new(context, location),
            mutations: DocumentMutations::new(
                Arc::clone(&context.api),
                Arc::clone(&context.cache),
                Arc::clone(&context.notifier),
                Arc::clone(&context.confirm),
            ),
            confirm: Arc::clone(&context.confirm),
        }
    }

    pub fn mutations(&self) -> &DocumentMutations {
        &self.mutations
    }

    pub fn set_status(&self, status: Filter<DocumentStatus>) {
        self.list
            .update_filters(|filters: &mut DocumentFilters| filters.status = status);
    }

    pub fn set_mime_type(&self, mime_type: Filter<String>) {
        self.list
            .update_filters(|filters: &mut DocumentFilters| filters.mime_type = mime_type);
    }

    pub fn set_project(&self, project_id: Filter<String>) {
        self.list
            .update_filters(|filters: &mut DocumentFilters| filters.project_id = project_id);
    }

    pub async fn delete(&self, document: &Document) -> Result<MutationOutcome<()>, MutationError> {
        self.mutations.delete(document).await
    }

    pub async fn download(&self, document: &Document) -> Result<DownloadLink, MutationError> {
        self.mutations.download(&document.id).await
    }

    /// Delete every selected row behind a single confirmation. Stops at the
    /// first failure; rows deleted before it stay deleted.
    pub async fn delete_selected(&self) -> Result<MutationOutcome<usize>, MutationError> {
        let selected = self.list.selected();
        if selected.is_empty() {
            return Ok(MutationOutcome::Completed(0));
        }

        let prompt = format!(
            "Are you sure you want to delete {} selected document(s)?",
            selected.len()
        );
        if !self.confirm.confirm(&prompt).await {
            return Ok(MutationOutcome::Declined);
        }

        for (deleted, id) in selected.iter().enumerate() {
            if let Err(err) = self.mutations.delete_confirmed(id).await {
                tracing::warn!(deleted, failed_id = %id, "Bulk deletion stopped");
                self.list.clear_selection();
                return Err(err);
            }
        }
        self.list.clear_selection();
        Ok(MutationOutcome::Completed(selected.len()))
    }
}

impl Deref for DocumentsView {
    type Target = ListView<Documents>;

    fn deref(&self) -> &Self::Target {
        &self.list
    }
}
