//! URL-driven job scraping.
//!
//! Strategies run in a fixed order until one extracts: the matching board
//! API first, then a raw page fetch handed to the text extractor.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::jobs::boards::BoardClient;
use crate::jobs::extractor::{ExtractionAttempt, ExtractionTier, JobExtractor};
use crate::jobs::html::strip_html;
use crate::jobs::models::ExtractedJobInfo;

/// Page text below this length is taken as a block page or an empty shell.
pub const MIN_PAGE_TEXT_LEN: usize = 100;
/// Largest raw page body read before stripping.
pub const MAX_PAGE_BYTES: usize = 2 * 1024 * 1024;

static GREENHOUSE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:boards|job-boards)(?:\.eu)?\.greenhouse\.io/([A-Za-z0-9_-]+)/jobs/(\d+)")
        .expect("valid greenhouse url regex")
});
static LEVER_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://jobs(?:\.eu)?\.lever\.co/([A-Za-z0-9_.-]+)/([0-9a-fA-F-]{36})")
        .expect("valid lever url regex")
});

/// A posting on a board with a public API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardPosting {
    Greenhouse { board: String, job_id: String },
    Lever { company: String, posting_id: Uuid },
}

impl BoardPosting {
    pub fn tier(&self) -> ExtractionTier {
        match self {
            BoardPosting::Greenhouse { .. } => ExtractionTier::GreenhouseApi,
            BoardPosting::Lever { .. } => ExtractionTier::LeverApi,
        }
    }
}

/// Matches `url` against the known board patterns, in priority order.
pub fn match_board(url: &str) -> Option<BoardPosting> {
    if let Some(caps) = GREENHOUSE_URL.captures(url) {
        return Some(BoardPosting::Greenhouse {
            board: caps[1].to_string(),
            job_id: caps[2].to_string(),
        });
    }
    if let Some(caps) = LEVER_URL.captures(url) {
        if let Ok(posting_id) = Uuid::parse_str(&caps[2]) {
            return Some(BoardPosting::Lever {
                company: caps[1].to_string(),
                posting_id,
            });
        }
    }
    None
}

#[derive(Debug, Error)]
enum PageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("page body exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

#[derive(Debug, Clone)]
enum ScrapeStrategy {
    BoardApi(BoardPosting),
    Page,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScrapedJob {
    pub url: String,
    pub tier: ExtractionTier,
    pub info: ExtractedJobInfo,
}

#[derive(Clone)]
pub struct JobScraper {
    http: Client,
    boards: BoardClient,
    extractor: JobExtractor,
    user_agent: String,
    max_page_bytes: usize,
}

impl JobScraper {
    pub fn new(http: Client, boards: BoardClient, extractor: JobExtractor, user_agent: String) -> Self {
        Self {
            http,
            boards,
            extractor,
            user_agent,
            max_page_bytes: MAX_PAGE_BYTES,
        }
    }

    pub fn with_max_page_bytes(mut self, max_page_bytes: usize) -> Self {
        self.max_page_bytes = max_page_bytes;
        self
    }

    fn strategies(url: &Url) -> Vec<ScrapeStrategy> {
        let mut strategies = Vec::with_capacity(2);
        if let Some(posting) = match_board(url.as_str()) {
            strategies.push(ScrapeStrategy::BoardApi(posting));
        }
        strategies.push(ScrapeStrategy::Page);
        strategies
    }

    /// Scrapes a single posting. Returns `None` when every strategy came up
    /// empty, including when the page looks blocked or invalid.
    pub async fn scrape_job(&self, url: &Url) -> Option<ScrapedJob> {
        for strategy in Self::strategies(url) {
            match self.attempt(&strategy, url).await {
                ExtractionAttempt::Extracted { tier, info } => {
                    info!("Scraped {url} via {tier:?}");
                    return Some(ScrapedJob {
                        url: url.to_string(),
                        tier,
                        info,
                    });
                }
                ExtractionAttempt::NoMatch => {}
                ExtractionAttempt::Failed(reason) => {
                    warn!("Scrape strategy {strategy:?} failed for {url}: {reason}");
                }
            }
        }
        None
    }

    async fn attempt(&self, strategy: &ScrapeStrategy, url: &Url) -> ExtractionAttempt {
        match strategy {
            ScrapeStrategy::BoardApi(posting) => self.attempt_board(posting).await,
            ScrapeStrategy::Page => self.attempt_page(url).await,
        }
    }

    async fn attempt_board(&self, posting: &BoardPosting) -> ExtractionAttempt {
        let result = match posting {
            BoardPosting::Greenhouse { board, job_id } => {
                self.boards.greenhouse_posting(board, job_id).await
            }
            BoardPosting::Lever {
                company,
                posting_id,
            } => self.boards.lever_posting(company, *posting_id).await,
        };

        match result {
            Ok(info) => ExtractionAttempt::Extracted {
                tier: posting.tier(),
                info,
            },
            Err(e) => ExtractionAttempt::Failed(e.to_string()),
        }
    }

    async fn attempt_page(&self, url: &Url) -> ExtractionAttempt {
        let text = match self.fetch_page_text(url).await {
            Ok(text) => text,
            Err(e) => return ExtractionAttempt::Failed(e.to_string()),
        };

        let len = text.chars().count();
        if len < MIN_PAGE_TEXT_LEN {
            return ExtractionAttempt::Failed(format!(
                "page text too short ({len} chars), likely blocked or invalid"
            ));
        }

        match self.extractor.extract_with_tier(&text).await {
            Some((tier, info)) => ExtractionAttempt::Extracted { tier, info },
            None => ExtractionAttempt::Failed("no extractable text".to_string()),
        }
    }

    async fn fetch_page_text(&self, url: &Url) -> Result<String, PageError> {
        debug!("Fetching page {url}");
        let mut response = self
            .http
            .get(url.clone())
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await?
            .error_for_status()?;

        let limit = self.max_page_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(PageError::TooLarge { limit });
        }

        // Content-Length may be absent or wrong; enforce the cap while reading.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > limit {
                return Err(PageError::TooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(strip_html(&String::from_utf8_lossy(&body)))
    }
}
