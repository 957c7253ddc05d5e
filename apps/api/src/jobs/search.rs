//! Job search over the configured company boards. Feeds the job cache on a miss.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail};
use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::jobs::boards::{BoardClient, BoardError};
use crate::jobs::cache::{normalize, NormalizedSearch};
use crate::jobs::models::{CachedJobData, JobResult, JobSearchParams, RemotePreference};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSource {
    Greenhouse(String),
    Lever(String),
}

impl fmt::Display for JobSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobSource::Greenhouse(board) => write!(f, "greenhouse:{board}"),
            JobSource::Lever(company) => write!(f, "lever:{company}"),
        }
    }
}

impl FromStr for JobSource {
    type Err = anyhow::Error;

    /// Parses `greenhouse:<board>` or `lever:<company>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, slug) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| anyhow!("job source '{s}' must look like 'greenhouse:<board>' or 'lever:<company>'"))?;
        let slug = slug.trim();
        if slug.is_empty() {
            bail!("job source '{s}' has an empty board name");
        }
        match kind.trim().to_lowercase().as_str() {
            "greenhouse" => Ok(JobSource::Greenhouse(slug.to_string())),
            "lever" => Ok(JobSource::Lever(slug.to_string())),
            other => bail!("unknown job source kind '{other}'"),
        }
    }
}

/// Parses a comma-separated source list. Empty input means no sources.
pub fn parse_sources(list: &str) -> anyhow::Result<Vec<JobSource>> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(JobSource::from_str)
        .collect()
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("all {0} job sources failed")]
    AllSourcesFailed(usize),
}

#[derive(Clone)]
pub struct JobSearchService {
    boards: BoardClient,
    sources: Vec<JobSource>,
    ttl: Duration,
}

impl JobSearchService {
    /// `ttl` only stamps `expires_at`; expiry itself is enforced by the store.
    pub fn new(boards: BoardClient, sources: Vec<JobSource>, ttl: Duration) -> Self {
        Self {
            boards,
            sources,
            ttl,
        }
    }

    pub fn sources(&self) -> &[JobSource] {
        &self.sources
    }

    async fn fetch_source(&self, source: &JobSource) -> Result<Vec<JobResult>, BoardError> {
        match source {
            JobSource::Greenhouse(board) => self.boards.greenhouse_jobs(board).await,
            JobSource::Lever(company) => self.boards.lever_jobs(company).await,
        }
    }

    /// Lists every source in turn and filters the postings. A failing source
    /// contributes nothing; the search fails only if every source failed,
    /// so an outage is never cached as an empty result.
    pub async fn search(&self, params: &JobSearchParams) -> Result<CachedJobData, SearchError> {
        let filters = normalize(params);
        let mut jobs = Vec::new();
        let mut source_counts = BTreeMap::new();
        let mut failures = 0usize;

        for source in &self.sources {
            match self.fetch_source(source).await {
                Ok(listed) => {
                    let before = jobs.len();
                    jobs.extend(listed.into_iter().filter(|job| matches_filters(job, &filters)));
                    source_counts.insert(source.to_string(), (jobs.len() - before) as u32);
                }
                Err(e) => {
                    warn!("Job source {source} failed: {e}");
                    failures += 1;
                    source_counts.insert(source.to_string(), 0);
                }
            }
        }

        if failures > 0 && failures == self.sources.len() {
            return Err(SearchError::AllSourcesFailed(failures));
        }

        info!(
            "Job search matched {} postings across {} sources",
            jobs.len(),
            self.sources.len()
        );

        let cached_at = Utc::now();
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or_else(|_| chrono::Duration::hours(1));
        Ok(CachedJobData {
            jobs,
            cached_at,
            expires_at: cached_at + ttl,
            source_counts,
            search_params: params.clone(),
        })
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.is_empty() || needles.iter().any(|n| haystack.contains(n.as_str()))
}

/// `filters` lists are already lowercased by `normalize`.
pub fn matches_filters(job: &JobResult, filters: &NormalizedSearch) -> bool {
    let title = job.title.to_lowercase();
    let location = job.location.as_deref().unwrap_or_default().to_lowercase();
    let description = job.description.as_deref().unwrap_or_default().to_lowercase();

    if !contains_any(&title, &filters.roles) {
        return false;
    }

    let location_ok = filters.locations.is_empty()
        || filters
            .locations
            .iter()
            .any(|l| location.contains(l.as_str()) || (l == "remote" && job.is_remote));
    if !location_ok {
        return false;
    }

    if !filters.skills.is_empty()
        && !contains_any(&title, &filters.skills)
        && !contains_any(&description, &filters.skills)
    {
        return false;
    }

    let remote_ok = match filters.remote_preference {
        RemotePreference::Any => true,
        RemotePreference::Remote => job.is_remote,
        RemotePreference::Onsite => !job.is_remote,
        RemotePreference::Hybrid => !job.is_remote || location.contains("hybrid"),
    };
    if !remote_ok {
        return false;
    }

    if filters.salary_min > 0 && job.salary_max.is_some_and(|max| max < filters.salary_min) {
        return false;
    }
    if filters.salary_max > 0 && job.salary_min.is_some_and(|min| min > filters.salary_max) {
        return false;
    }

    true
}
