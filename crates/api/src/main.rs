use std::sync::Arc;

use anyhow::Context;

use gradeportal_auth::SessionStore;
use gradeportal_infra::config::PortalConfig;
use gradeportal_infra::session::RestSessionStore;
use gradeportal_infra::store::{PolicyStore, RestPolicyStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gradeportal_observability::init();

    let config = PortalConfig::from_env().context("failed to load configuration")?;
    tracing::info!(store_url = %config.store_url, "configuration loaded");

    let sessions: Arc<dyn SessionStore> = Arc::new(RestSessionStore::from_config(&config));
    let store: Arc<dyn PolicyStore> = Arc::new(RestPolicyStore::from_config(&config));
    let app = gradeportal_api::app::build_app(sessions, store);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
