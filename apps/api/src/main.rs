mod cache;
mod config;
mod errors;
mod jobs;
mod llm_client;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::{CacheClient, CacheMetrics, KeyValueStore, RedisStore};
use crate::config::Config;
use crate::jobs::boards::BoardClient;
use crate::jobs::cache::JobCache;
use crate::jobs::extractor::{JobExtractor, JobInfoModel, LlmJobModel};
use crate::jobs::scraper::JobScraper;
use crate::jobs::search::JobSearchService;
use crate::jobs::ssrf::redirect_policy;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Job Search API v{}", env!("CARGO_PKG_VERSION"));

    let timeout = Duration::from_secs(config.http_timeout_secs);
    let ttl = Duration::from_secs(config.job_cache_ttl_secs);

    // Redis is optional and connected lazily
    let store = open_store(config.redis_url.as_deref())?;
    let cache = CacheClient::new(store, Arc::new(CacheMetrics::new()));
    let job_cache = JobCache::new(cache, ttl);

    let http = reqwest::Client::builder()
        .timeout(timeout)
        .redirect(redirect_policy())
        .user_agent(config.scraper_user_agent.clone())
        .build()
        .context("Failed to build HTTP client")?;
    let boards = BoardClient::new(http.clone());

    let model: Option<Arc<dyn JobInfoModel>> = match &config.anthropic_api_key {
        Some(key) => {
            let llm = LlmClient::new(key.clone(), Duration::from_secs(config.llm_timeout_secs))?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(Arc::new(LlmJobModel(llm)))
        }
        None => {
            info!("ANTHROPIC_API_KEY not set; extraction uses heuristics only");
            None
        }
    };
    let extractor = JobExtractor::new(model);

    let search = JobSearchService::new(boards.clone(), config.job_sources.clone(), ttl);
    info!("Job search sources: {}", config.job_sources.len());

    let scraper = JobScraper::new(
        http,
        boards,
        extractor.clone(),
        config.scraper_user_agent.clone(),
    );

    let state = AppState {
        job_cache,
        search: Arc::new(search),
        scraper,
        extractor,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// An unreachable Redis is not fatal: the store connects on first use and
/// failures are counted per call. Only a malformed URL stops startup.
fn open_store(redis_url: Option<&str>) -> Result<Option<Arc<dyn KeyValueStore>>> {
    let Some(url) = redis_url else {
        info!("REDIS_URL not set; job cache disabled");
        return Ok(None);
    };

    let store = RedisStore::open(url).context("REDIS_URL is not a valid Redis URL")?;
    info!("Redis cache configured");
    Ok(Some(Arc::new(store)))
}
