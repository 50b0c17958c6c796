use dashboard_frontend::config::get_configuration;
use dashboard_frontend::services::{DashboardApi, HttpDashboardApi, ToastCenter};
use dashboard_frontend::startup::build_router;
use dashboard_frontend::AppState;
use service_core::observability::init_tracing;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing("dashboard-frontend", &configuration.telemetry);

    let api: Arc<dyn DashboardApi> = Arc::new(
        HttpDashboardApi::new(configuration.api.clone())
            .map_err(|e| anyhow::anyhow!("Failed to build API client: {}", e))?,
    );
    let notifier = Arc::new(ToastCenter::default());
    let state = AppState::new(api, notifier, configuration.list.clone());

    let app = build_router(state);

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!(
        api = %configuration.api.base_url,
        page_size = configuration.list.page_size,
        "Starting dashboard-frontend on {}",
        address
    );
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
