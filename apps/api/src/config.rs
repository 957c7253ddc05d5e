use anyhow::{Context, Result};

use crate::jobs::search::{parse_sources, JobSource};

/// Application configuration loaded from environment variables.
/// Everything is optional; missing backends degrade instead of failing startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absent means the job cache is bypassed.
    pub redis_url: Option<String>,
    /// Absent means extraction goes straight to heuristics.
    pub anthropic_api_key: Option<String>,
    pub job_cache_ttl_secs: u64,
    pub job_sources: Vec<JobSource>,
    pub scraper_user_agent: String,
    /// Board APIs and page fetches.
    pub http_timeout_secs: u64,
    /// Per attempt against the LLM provider.
    pub llm_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // Unset and blank are treated the same.
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Config {
            redis_url: var("REDIS_URL"),
            anthropic_api_key: var("ANTHROPIC_API_KEY"),
            job_cache_ttl_secs: parse_var("JOB_CACHE_TTL_SECS", var("JOB_CACHE_TTL_SECS"), 3600)?,
            job_sources: parse_sources(&var("JOB_SOURCES").unwrap_or_default())
                .context("JOB_SOURCES must be a comma-separated list like 'greenhouse:acme,lever:initech'")?,
            scraper_user_agent: var("SCRAPER_USER_AGENT")
                .unwrap_or_else(|| format!("jobsearch-api/{}", env!("CARGO_PKG_VERSION"))),
            http_timeout_secs: parse_var("HTTP_TIMEOUT_SECS", var("HTTP_TIMEOUT_SECS"), 20)?,
            llm_timeout_secs: parse_var("LLM_TIMEOUT_SECS", var("LLM_TIMEOUT_SECS"), 120)?,
            port: parse_var("PORT", var("PORT"), 8080)?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_var<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
