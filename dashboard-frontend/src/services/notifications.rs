use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastVariant {
    Default,
    Destructive,
}

/// Transient user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub variant: ToastVariant,
}

impl Toast {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: ToastVariant::Default,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: ToastVariant::Destructive,
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

/// Fans toasts out to every subscribed view.
pub struct ToastCenter {
    sender: broadcast::Sender<Toast>,
}

impl ToastCenter {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.sender.subscribe()
    }
}

impl Default for ToastCenter {
    fn default() -> Self {
        Self::new(32)
    }
}

impl Notifier for ToastCenter {
    fn notify(&self, toast: Toast) {
        match toast.variant {
            ToastVariant::Default => {
                tracing::info!(title = %toast.title, description = %toast.description, "Toast")
            }
            ToastVariant::Destructive => {
                tracing::warn!(title = %toast.title, description = %toast.description, "Toast")
            }
        }
        let _ = self.sender.send(toast);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_toasts() {
        let center = ToastCenter::default();
        let mut rx = center.subscribe();

        center.notify(Toast::error("Upload failed", "Network connection failed."));

        let toast = rx.recv().await.unwrap();
        assert_eq!(toast.variant, ToastVariant::Destructive);
        assert_eq!(toast.title, "Upload failed");
    }

    #[test]
    fn notifying_without_subscribers_is_fine() {
        ToastCenter::default().notify(Toast::success("Document deleted", "Done."));
    }
}
