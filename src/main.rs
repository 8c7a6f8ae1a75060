use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use zeestream_api::{
    api::{create_router, AppState},
    config::Config,
    services::{
        chat::ChatPolicy,
        providers::{firestore::FirestoreCatalog, gemini::GeminiModel, identity::IdentityToolkit},
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("zeestream_api=debug,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let store = Arc::new(FirestoreCatalog::new(
        config.store_api_url.clone(),
        config.project_id.clone(),
        config.catalog_collection.clone(),
        config.web_api_key.clone(),
    ));
    let identity = Arc::new(IdentityToolkit::new(
        config.identity_api_url.clone(),
        config.web_api_key.clone(),
    ));
    let model = Arc::new(GeminiModel::new(
        config.gemini_api_url.clone(),
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
    ));

    let state = AppState::new(store, identity, model, ChatPolicy::from(&config));
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Zeestream API listening");
    axum::serve(listener, app).await?;

    Ok(())
}
