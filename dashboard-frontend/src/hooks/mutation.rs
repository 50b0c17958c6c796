//! Shared plumbing for create/update/delete hooks.

use crate::services::{ApiError, Notifier, QueryCache, Toast};
use async_trait::async_trait;
use service_core::error::AppError;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MutationError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Invalid input: {0}")]
    Invalid(#[from] validator::ValidationErrors),

    #[error("A previous request from this control is still in flight")]
    Busy,
}

impl MutationError {
    pub fn user_message(&self) -> String {
        match self {
            MutationError::Api(err) => err.user_message(),
            MutationError::Invalid(_) => "Please check your input and try again.".to_string(),
            MutationError::Busy => "Please wait for the current request to finish.".to_string(),
        }
    }
}

impl From<MutationError> for AppError {
    fn from(err: MutationError) -> Self {
        match err {
            MutationError::Api(err) => err.into(),
            MutationError::Invalid(errors) => AppError::ValidationError(errors),
            MutationError::Busy => AppError::Conflict(anyhow::anyhow!(
                "A previous request for this resource is still in flight"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome<T> {
    Completed(T),
    /// The user answered "no" to the confirmation prompt.
    Declined,
}

impl<T> MutationOutcome<T> {
    pub fn is_declined(&self) -> bool {
        matches!(self, MutationOutcome::Declined)
    }

    pub fn completed(self) -> Option<T> {
        match self {
            MutationOutcome::Completed(value) => Some(value),
            MutationOutcome::Declined => None,
        }
    }
}

/// Confirmation step in front of destructive actions.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Used where the caller has already confirmed, e.g. an HTTP request that
/// carried `confirm=true`.
pub struct PreConfirmed;

#[async_trait]
impl Confirm for PreConfirmed {
    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Counts one in-flight call for as long as it lives, including when the
/// call's future is dropped half-way.
struct PendingGuard<'a>(&'a AtomicUsize);

impl<'a> PendingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// One backend action behind one control.
///
/// Success runs the caller's cache effects and posts the toast they
/// return; failure posts a destructive toast with the error's user message
/// and touches nothing else.
///
/// A gated mutation backs a single on-screen control: [`trigger`] refuses
/// to start while a call is in flight. Ungated mutations serve many callers
/// at once (the HTTP surface) and never refuse.
///
/// [`trigger`]: Mutation::trigger
pub struct Mutation {
    name: &'static str,
    error_title: &'static str,
    gated: bool,
    in_flight: AtomicUsize,
    cache: Arc<QueryCache>,
    notifier: Arc<dyn Notifier>,
}

impl Mutation {
    pub fn new(
        name: &'static str,
        error_title: &'static str,
        cache: Arc<QueryCache>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            name,
            error_title,
            gated: true,
            in_flight: AtomicUsize::new(0),
            cache,
            notifier,
        }
    }

    pub fn ungated(mut self) -> Self {
        self.gated = false;
        self
    }

    /// Whether a call is in flight; the control should be disabled.
    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Execute `call`. Concurrent calls are not de-duplicated.
    pub async fn run<T, Fut, S>(&self, call: Fut, on_success: S) -> Result<T, MutationError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
        S: FnOnce(&T, &QueryCache) -> Toast,
    {
        let _pending = PendingGuard::enter(&self.in_flight);

        match call.await {
            Ok(value) => {
                tracing::info!(mutation = self.name, "Mutation succeeded");
                let toast = on_success(&value, &self.cache);
                self.notifier.notify(toast);
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(
                    mutation = self.name,
                    code = %err.code,
                    status = err.status,
                    request_id = ?err.request_id,
                    "Mutation failed"
                );
                self.notifier
                    .notify(Toast::error(self.error_title, err.user_message()));
                Err(err.into())
            }
        }
    }

    /// Like [`run`](Self::run), but a gated mutation refuses to start while
    /// a previous call is in flight, as a disabled button would.
    pub async fn trigger<T, Fut, S>(&self, call: Fut, on_success: S) -> Result<T, MutationError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
        S: FnOnce(&T, &QueryCache) -> Toast,
    {
        if self.gated && self.is_pending() {
            tracing::debug!(mutation = self.name, "Ignoring trigger while pending");
            return Err(MutationError::Busy);
        }
        self.run(call, on_success).await
    }

    /// Refuse input that failed validation before any call is made.
    pub fn reject(&self, errors: validator::ValidationErrors) -> MutationError {
        tracing::debug!(mutation = self.name, errors = %errors, "Rejected invalid input");
        let err = MutationError::Invalid(errors);
        self.notifier
            .notify(Toast::error(self.error_title, err.user_message()));
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{QueryKey, ToastCenter, ToastVariant};
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn mutation() -> (Mutation, Arc<QueryCache>, Arc<ToastCenter>) {
        let cache = Arc::new(QueryCache::new(Duration::from_secs(30)));
        let toasts = Arc::new(ToastCenter::default());
        let mutation = Mutation::new("test", "Update failed", cache.clone(), toasts.clone());
        (mutation, cache, toasts)
    }

    #[tokio::test]
    async fn success_runs_effects_and_toasts() {
        let (mutation, cache, toasts) = mutation();
        let mut rx = toasts.subscribe();
        let key = QueryKey::new("documents").with("list");
        cache.set(key.clone().with("page=1"), 1u32);

        let value = mutation
            .run(async { Ok::<_, ApiError>(5u32) }, |value, cache| {
                cache.invalidate(&key);
                Toast::success("Saved", format!("value {}", value))
            })
            .await
            .unwrap();

        assert_eq!(value, 5);
        assert_eq!(cache.get_fresh::<u32>(&key.with("page=1")), None);
        assert_eq!(rx.recv().await.unwrap().description, "value 5");
        assert!(!mutation.is_pending());
    }

    #[tokio::test]
    async fn failure_toasts_user_message_and_skips_effects() {
        let (mutation, _cache, toasts) = mutation();
        let mut rx = toasts.subscribe();

        let result = mutation
            .run(
                async { Err::<u32, _>(ApiError::new("FORBIDDEN", 403, "denied")) },
                |_, _| panic!("effects must not run on failure"),
            )
            .await;

        assert!(matches!(result, Err(MutationError::Api(_))));
        let toast = rx.recv().await.unwrap();
        assert_eq!(toast.variant, ToastVariant::Destructive);
        assert_eq!(toast.title, "Update failed");
        assert_eq!(
            toast.description,
            "You do not have permission to perform this action."
        );
    }

    #[tokio::test]
    async fn trigger_is_refused_while_pending() {
        let (mutation, _cache, _toasts) = mutation();
        let (release, wait) = oneshot::channel::<()>();

        let first = mutation.run(
            async move {
                let _ = wait.await;
                Ok::<_, ApiError>(1u32)
            },
            |_, _| Toast::success("Done", ""),
        );
        tokio::pin!(first);

        // Drive the first call until it parks on the oneshot.
        assert!(futures::poll!(first.as_mut()).is_pending());
        assert!(mutation.is_pending());

        let second = mutation
            .trigger(async { Ok::<_, ApiError>(2u32) }, |_, _| Toast::success("Done", ""))
            .await;
        assert!(matches!(second, Err(MutationError::Busy)));

        // `run` is not gated: concurrent calls both go through.
        let third = mutation
            .run(async { Ok::<_, ApiError>(3u32) }, |_, _| Toast::success("Done", ""))
            .await
            .unwrap();
        assert_eq!(third, 3);

        release.send(()).unwrap();
        assert_eq!(first.await.unwrap(), 1);
        assert!(!mutation.is_pending());
    }

    #[tokio::test]
    async fn ungated_trigger_runs_alongside_a_pending_call() {
        let (mutation, _cache, _toasts) = mutation();
        let mutation = mutation.ungated();
        let (release, wait) = oneshot::channel::<()>();

        let first = mutation.trigger(
            async move {
                let _ = wait.await;
                Ok::<_, ApiError>(1u32)
            },
            |_, _| Toast::success("Done", ""),
        );
        tokio::pin!(first);
        assert!(futures::poll!(first.as_mut()).is_pending());

        let second = mutation
            .trigger(async { Ok::<_, ApiError>(2u32) }, |_, _| Toast::success("Done", ""))
            .await
            .unwrap();
        assert_eq!(second, 2);

        release.send(()).unwrap();
        assert_eq!(first.await.unwrap(), 1);
    }
}
