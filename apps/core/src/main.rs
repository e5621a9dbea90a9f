// KOUNHANY assistant backend entry point.
// Wires the store, the session memory and the collaborator actors together,
// then serves the HTTP API.

mod actors;
mod analytics;
mod api;
mod brain;
mod cache;
mod config;
mod database;
mod error;
mod knowledge;
mod memory;
mod models;
mod obd;

#[cfg(test)]
mod tests;

use actors::llm::LlmActorHandle;
use actors::search::{self, SearchActorHandle};
use actors::supervisor::SupervisorHandle;
use actors::vision::VisionActorHandle;
use api::AppState;
use config::Config;
use memory::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// How often expired search-cache entries are swept out.
const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(3_600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    let pool = database::init_db(&config.database_path).await?;
    knowledge::seed(&pool).await?;

    let memory = Arc::new(SessionStore::new());

    let llm = Arc::new(LlmActorHandle::new(config.llm_url.clone(), config.llm_timeout));
    let vision = Arc::new(VisionActorHandle::new(
        config.vision_url.clone(),
        config.vision_timeout,
    ));
    let search_actor = Arc::new(SearchActorHandle::new(
        pool.clone(),
        search::DEFAULT_ENDPOINT.to_string(),
        config.search_cache_ttl_hours,
        config.search_timeout,
    ));

    let supervisor = SupervisorHandle::spawn_with_actors(
        llm,
        vision,
        Arc::clone(&search_actor),
        pool.clone(),
        Arc::clone(&memory),
    );

    // Periodic sweep of expired search-cache rows.
    {
        let pool = pool.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CACHE_SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                match cache::purge_expired(&pool).await {
                    Ok(0) => {}
                    Ok(purged) => info!("Purged {} expired search-cache entries", purged),
                    Err(e) => warn!("Search-cache sweep failed: {}", e),
                }
            }
        });
    }

    let state = Arc::new(AppState {
        pool,
        supervisor,
        memory,
        search: search_actor,
        config: config.clone(),
        http: reqwest::Client::new(),
    });

    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
