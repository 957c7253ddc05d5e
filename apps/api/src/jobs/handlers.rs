//! Axum route handlers for the Jobs API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::errors::AppError;
use crate::jobs::cache::JobCacheStats;
use crate::jobs::extractor::{ExtractionTier, MAX_EXTRACT_TEXT_LEN, MIN_EXTRACT_TEXT_LEN};
use crate::jobs::models::{CachedJobData, ExtractedJobInfo, JobSearchParams};
use crate::jobs::scraper::ScrapedJob;
use crate::jobs::ssrf::validate_public_url;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub tier: ExtractionTier,
    pub info: ExtractedJobInfo,
}

#[derive(Debug, Serialize)]
pub struct InvalidateResponse {
    pub deleted: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/jobs/search
///
/// Serves from the job cache; on a miss lists the configured boards and
/// caches the filtered result.
pub async fn handle_search(
    State(state): State<AppState>,
    Json(params): Json<JobSearchParams>,
) -> Result<Json<CachedJobData>, AppError> {
    if let (Some(min), Some(max)) = (params.salary_min, params.salary_max) {
        if min > max {
            return Err(AppError::Validation(
                "salary_min cannot exceed salary_max".to_string(),
            ));
        }
    }

    let search = state.search.clone();
    let query = params.clone();
    let data = state
        .job_cache
        .with_cache(&params, || async move { search.search(&query).await })
        .await?;

    Ok(Json(data))
}

/// GET /api/v1/jobs/cache/stats
pub async fn handle_cache_stats(State(state): State<AppState>) -> Json<JobCacheStats> {
    Json(state.job_cache.stats())
}

/// POST /api/v1/jobs/cache/stats/reset
pub async fn handle_reset_cache_stats(State(state): State<AppState>) -> Json<JobCacheStats> {
    state.job_cache.reset_stats();
    Json(state.job_cache.stats())
}

/// DELETE /api/v1/jobs/cache
pub async fn handle_invalidate_cache(State(state): State<AppState>) -> Json<InvalidateResponse> {
    let deleted = state.job_cache.invalidate_all().await;
    info!("Invalidated {deleted} cached job searches");
    Json(InvalidateResponse { deleted })
}

/// POST /api/v1/jobs/scrape
///
/// Accepts only absolute http(s) URLs whose host resolves to public addresses.
pub async fn handle_scrape(
    State(state): State<AppState>,
    Json(request): Json<ScrapeRequest>,
) -> Result<Json<ScrapedJob>, AppError> {
    let url = Url::parse(request.url.trim())
        .map_err(|e| AppError::Validation(format!("url is not valid: {e}")))?;
    validate_public_url(&url)
        .await
        .map_err(|e| AppError::Validation(format!("url cannot be scraped: {e}")))?;

    state
        .scraper
        .scrape_job(&url)
        .await
        .map(Json)
        .ok_or_else(|| AppError::UnprocessableEntity(format!("No job posting could be extracted from {url}")))
}

/// POST /api/v1/jobs/extract
///
/// Extracts structured fields from pasted posting text.
pub async fn handle_extract(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, AppError> {
    let len = request.text.trim().chars().count();
    if len < MIN_EXTRACT_TEXT_LEN {
        return Err(AppError::Validation(format!(
            "text must be at least {MIN_EXTRACT_TEXT_LEN} characters"
        )));
    }
    if len > MAX_EXTRACT_TEXT_LEN {
        return Err(AppError::Validation(format!(
            "text must be at most {MAX_EXTRACT_TEXT_LEN} characters"
        )));
    }

    let (tier, info) = state
        .extractor
        .extract_with_tier(&request.text)
        .await
        .ok_or_else(|| AppError::UnprocessableEntity("No job details could be extracted".to_string()))?;

    Ok(Json(ExtractResponse { tier, info }))
}
