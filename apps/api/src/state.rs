use std::sync::Arc;

use crate::jobs::cache::JobCache;
use crate::jobs::extractor::JobExtractor;
use crate::jobs::scraper::JobScraper;
use crate::jobs::search::JobSearchService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub job_cache: JobCache,
    pub search: Arc<JobSearchService>,
    pub scraper: JobScraper,
    /// Same extractor the scraper falls back to for page text.
    pub extractor: JobExtractor,
}
