use super::mutation::{Confirm, Mutation, MutationError, MutationOutcome};
use crate::models::{Document, DocumentUpdate, DownloadLink, IngestRequest, UploadRequest};
use crate::services::{keys, DashboardApi, Notifier, QueryCache, Toast};
use std::sync::Arc;
use validator::Validate;

/// Create/update/delete/download actions for documents.
pub struct DocumentMutations {
    api: Arc<dyn DashboardApi>,
    confirm: Arc<dyn Confirm>,
    uploading: Mutation,
    ingesting: Mutation,
    updating: Mutation,
    deleting: Mutation,
    downloading: Mutation,
}

impl DocumentMutations {
    /// Hooks for one page: each control allows one call at a time.
    pub fn new(
        api: Arc<dyn DashboardApi>,
        cache: Arc<QueryCache>,
        notifier: Arc<dyn Notifier>,
        confirm: Arc<dyn Confirm>,
    ) -> Self {
        Self::build(api, cache, notifier, confirm, true)
    }

    /// Hooks shared by every request of the HTTP surface. Concurrent calls
    /// are never refused.
    pub fn shared(
        api: Arc<dyn DashboardApi>,
        cache: Arc<QueryCache>,
        notifier: Arc<dyn Notifier>,
        confirm: Arc<dyn Confirm>,
    ) -> Self {
        Self::build(api, cache, notifier, confirm, false)
    }

    fn build(
        api: Arc<dyn DashboardApi>,
        cache: Arc<QueryCache>,
        notifier: Arc<dyn Notifier>,
        confirm: Arc<dyn Confirm>,
        gated: bool,
    ) -> Self {
        let mutation = |name, error_title| {
            let mutation =
                Mutation::new(name, error_title, Arc::clone(&cache), Arc::clone(&notifier));
            if gated {
                mutation
            } else {
                mutation.ungated()
            }
        };

        Self {
            uploading: mutation("upload_document", "Upload failed"),
            ingesting: mutation("ingest_document", "Ingestion failed"),
            updating: mutation("update_document", "Update failed"),
            deleting: mutation("delete_document", "Deletion failed"),
            downloading: mutation("download_document", "Download failed"),
            api,
            confirm,
        }
    }

    pub async fn upload(&self, upload: UploadRequest) -> Result<Document, MutationError> {
        if let Err(errors) = upload.validate() {
            return Err(self.uploading.reject(errors));
        }

        self.uploading
            .trigger(self.api.upload_document(upload), |document, cache| {
                cache.invalidate(&keys::lists(keys::DOCUMENTS));
                Toast::success(
                    "Document uploaded",
                    format!("\"{}\" has been uploaded successfully.", document.name),
                )
            })
            .await
    }

    pub async fn ingest(&self, request: &IngestRequest) -> Result<Document, MutationError> {
        if let Err(errors) = request.validate() {
            return Err(self.ingesting.reject(errors));
        }

        self.ingesting
            .trigger(self.api.ingest_document(request), |document, cache| {
                cache.invalidate(&keys::lists(keys::DOCUMENTS));
                Toast::success(
                    "Document ingested",
                    format!(
                        "\"{}\" has been ingested from URL successfully.",
                        document.name
                    ),
                )
            })
            .await
    }

    pub async fn update(
        &self,
        id: &str,
        update: &DocumentUpdate,
    ) -> Result<Document, MutationError> {
        if let Err(errors) = update.validate() {
            return Err(self.updating.reject(errors));
        }

        self.updating
            .trigger(self.api.update_document(id, update), |document, cache| {
                cache.set(keys::item(keys::DOCUMENTS, &document.id), document.clone());
                cache.invalidate(&keys::lists(keys::DOCUMENTS));
                Toast::success(
                    "Document updated",
                    format!("\"{}\" has been updated successfully.", document.name),
                )
            })
            .await
    }

    /// Ask for confirmation, then delete. A "no" makes no call and posts no
    /// toast.
    pub async fn delete(&self, document: &Document) -> Result<MutationOutcome<()>, MutationError> {
        let prompt = format!("Are you sure you want to delete \"{}\"?", document.name);
        if !self.confirm.confirm(&prompt).await {
            tracing::debug!(document_id = %document.id, "Deletion declined");
            return Ok(MutationOutcome::Declined);
        }
        self.delete_confirmed(&document.id)
            .await
            .map(MutationOutcome::Completed)
    }

    /// Delete without prompting; the caller has already confirmed.
    pub async fn delete_confirmed(&self, id: &str) -> Result<(), MutationError> {
        self.deleting
            .run(self.api.delete_document(id), |_, cache| {
                cache.remove(&keys::item(keys::DOCUMENTS, id));
                cache.invalidate(&keys::root(keys::DOCUMENTS));
                Toast::success(
                    "Document deleted",
                    "The document has been deleted successfully.",
                )
            })
            .await
    }

    /// Fetch a signed link. Nothing is invalidated.
    pub async fn download(&self, id: &str) -> Result<DownloadLink, MutationError> {
        self.downloading
            .run(self.api.download_link(id), |_, _| {
                Toast::success(
                    "Download started",
                    "Your document download has been initiated.",
                )
            })
            .await
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading.is_pending()
    }

    pub fn is_ingesting(&self) -> bool {
        self.ingesting.is_pending()
    }

    pub fn is_updating(&self) -> bool {
        self.updating.is_pending()
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting.is_pending()
    }

    pub fn is_downloading(&self) -> bool {
        self.downloading.is_pending()
    }
}
