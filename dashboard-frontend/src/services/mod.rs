pub mod api;
pub mod cache;
pub mod error;
pub mod http_api;
pub mod notifications;

pub use api::{DashboardApi, Documents, Jobs, ListResource};
pub use cache::{keys, QueryCache, QueryKey};
pub use error::ApiError;
pub use http_api::HttpDashboardApi;
pub use notifications::{Notifier, Toast, ToastCenter, ToastVariant};
