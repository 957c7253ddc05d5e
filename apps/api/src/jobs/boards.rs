//! Public job-board APIs: Greenhouse and Lever.
//!
//! Both boards expose unauthenticated JSON endpoints for single postings and
//! for a company's full listing. Responses are mapped onto the shared
//! `ExtractedJobInfo` / `JobResult` shapes here.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::jobs::heuristics::{
    extract_employment_type, extract_experience_level, extract_salary, extract_sections,
    extract_skills, truncate_chars,
};
use crate::jobs::html::{decode_entities, strip_html};
use crate::jobs::models::{ExtractedJobInfo, JobResult};

const GREENHOUSE_API: &str = "https://boards-api.greenhouse.io/v1/boards";
const LEVER_API: &str = "https://api.lever.co/v0/postings";
const LISTING_DESCRIPTION_CHARS: usize = 2000;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { status: u16, url: String },
}

#[derive(Debug, Deserialize)]
struct GreenhouseLocation {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GreenhouseJob {
    id: u64,
    title: String,
    location: Option<GreenhouseLocation>,
    /// Entity-escaped HTML.
    content: Option<String>,
    absolute_url: Option<String>,
    updated_at: Option<String>,
    company_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GreenhouseListing {
    jobs: Vec<GreenhouseJob>,
}

#[derive(Debug, Default, Deserialize)]
struct LeverCategories {
    location: Option<String>,
    commitment: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LeverList {
    text: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct LeverSalaryRange {
    min: Option<f64>,
    max: Option<f64>,
    currency: Option<String>,
    interval: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeverPosting {
    id: String,
    text: String,
    #[serde(default)]
    categories: LeverCategories,
    description_plain: Option<String>,
    description: Option<String>,
    #[serde(default)]
    lists: Vec<LeverList>,
    additional_plain: Option<String>,
    workplace_type: Option<String>,
    hosted_url: Option<String>,
    salary_range: Option<LeverSalaryRange>,
    /// Milliseconds since the epoch.
    created_at: Option<i64>,
}

/// HTTP client for the board APIs. Base URLs are overridable for tests.
#[derive(Clone)]
pub struct BoardClient {
    http: Client,
    greenhouse_api: String,
    lever_api: String,
}

impl BoardClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            greenhouse_api: GREENHOUSE_API.to_string(),
            lever_api: LEVER_API.to_string(),
        }
    }

    pub fn with_api_bases(
        mut self,
        greenhouse_api: impl Into<String>,
        lever_api: impl Into<String>,
    ) -> Self {
        self.greenhouse_api = greenhouse_api.into();
        self.lever_api = lever_api.into();
        self
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, BoardError> {
        debug!("GET {url}");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BoardError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.json::<T>().await?)
    }

    pub async fn greenhouse_posting(
        &self,
        board: &str,
        job_id: &str,
    ) -> Result<ExtractedJobInfo, BoardError> {
        let url = format!("{}/{board}/jobs/{job_id}", self.greenhouse_api);
        let job: GreenhouseJob = self.get_json(&url).await?;
        Ok(greenhouse_to_info(job, board))
    }

    pub async fn lever_posting(
        &self,
        company: &str,
        posting_id: Uuid,
    ) -> Result<ExtractedJobInfo, BoardError> {
        let url = format!("{}/{company}/{posting_id}", self.lever_api);
        let posting: LeverPosting = self.get_json(&url).await?;
        Ok(lever_to_info(posting, company))
    }

    pub async fn greenhouse_jobs(&self, board: &str) -> Result<Vec<JobResult>, BoardError> {
        let url = format!("{}/{board}/jobs?content=true", self.greenhouse_api);
        let listing: GreenhouseListing = self.get_json(&url).await?;
        Ok(listing
            .jobs
            .into_iter()
            .map(|job| greenhouse_to_result(job, board))
            .collect())
    }

    pub async fn lever_jobs(&self, company: &str) -> Result<Vec<JobResult>, BoardError> {
        let url = format!("{}/{company}?mode=json", self.lever_api);
        let postings: Vec<LeverPosting> = self.get_json(&url).await?;
        Ok(postings
            .into_iter()
            .map(|posting| lever_to_result(posting, company))
            .collect())
    }
}

/// "acme-robotics" -> "Acme Robotics". Lever payloads carry no company name.
pub fn company_from_slug(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn mentions_remote(text: Option<&str>) -> bool {
    text.is_some_and(|t| t.to_lowercase().contains("remote"))
}

fn greenhouse_text(job: &GreenhouseJob) -> String {
    job.content
        .as_deref()
        .map(|c| strip_html(&decode_entities(c)))
        .unwrap_or_default()
}

fn greenhouse_to_info(job: GreenhouseJob, board: &str) -> ExtractedJobInfo {
    let text = greenhouse_text(&job);
    let (requirements, responsibilities, benefits) = extract_sections(&text);
    let location = job.location.map(|l| l.name).filter(|l| !l.trim().is_empty());

    ExtractedJobInfo {
        experience_level: extract_experience_level(Some(&job.title), &text),
        is_remote: mentions_remote(location.as_deref()),
        company: Some(job.company_name.unwrap_or_else(|| company_from_slug(board))),
        title: Some(job.title),
        location,
        salary: extract_salary(&text),
        requirements,
        responsibilities,
        benefits,
        employment_type: extract_employment_type(&text),
        skills: extract_skills(&text),
        description: Some(text).filter(|t| !t.is_empty()),
    }
}

fn greenhouse_to_result(job: GreenhouseJob, board: &str) -> JobResult {
    let text = greenhouse_text(&job);
    let location = job.location.map(|l| l.name).filter(|l| !l.trim().is_empty());
    let posted_at = job
        .updated_at
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.with_timezone(&Utc));

    JobResult {
        id: format!("greenhouse:{}", job.id),
        url: job
            .absolute_url
            .unwrap_or_else(|| format!("https://boards.greenhouse.io/{board}/jobs/{}", job.id)),
        title: job.title,
        company: job.company_name.unwrap_or_else(|| company_from_slug(board)),
        is_remote: mentions_remote(location.as_deref()),
        location,
        description: Some(truncate_chars(&text, LISTING_DESCRIPTION_CHARS)).filter(|t| !t.is_empty()),
        salary_min: None,
        salary_max: None,
        source: "greenhouse".to_string(),
        posted_at,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ListKind {
    Requirements,
    Responsibilities,
    Benefits,
}

fn classify_list(heading: &str) -> Option<ListKind> {
    let h = heading.to_lowercase();
    let any = |needles: &[&str]| needles.iter().any(|n| h.contains(n));

    if any(&["require", "qualif", "you have", "you bring", "looking for", "about you", "you need"]) {
        Some(ListKind::Requirements)
    } else if any(&["responsib", "you will", "you'll", "what you do", "day to day", "the role"]) {
        Some(ListKind::Responsibilities)
    } else if any(&["benefit", "perk", "we offer"]) {
        Some(ListKind::Benefits)
    } else {
        None
    }
}

fn list_items(html: &str) -> Vec<String> {
    strip_html(html)
        .lines()
        .map(|l| l.trim_start_matches("- ").trim())
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

fn lever_salary(range: &LeverSalaryRange) -> Option<String> {
    let amount = |v: f64| format!("{}", v.round() as u64);
    let span = match (range.min, range.max) {
        (Some(min), Some(max)) => format!("{} - {}", amount(min), amount(max)),
        (Some(v), None) | (None, Some(v)) => amount(v),
        (None, None) => return None,
    };
    let mut salary = match range.currency.as_deref() {
        Some(currency) => format!("{currency} {span}"),
        None => span,
    };
    if let Some(interval) = range.interval.as_deref() {
        salary.push_str(&format!(" ({interval})"));
    }
    Some(salary)
}

fn lever_text(posting: &LeverPosting) -> String {
    let description = posting
        .description_plain
        .clone()
        .or_else(|| posting.description.as_deref().map(strip_html))
        .unwrap_or_default();
    let lists = posting
        .lists
        .iter()
        .map(|l| format!("{}\n{}", l.text, strip_html(&l.content)))
        .collect::<Vec<_>>()
        .join("\n\n");
    let additional = posting.additional_plain.clone().unwrap_or_default();

    [description, lists, additional]
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn lever_is_remote(posting: &LeverPosting) -> bool {
    posting
        .workplace_type
        .as_deref()
        .is_some_and(|w| w.eq_ignore_ascii_case("remote"))
        || mentions_remote(posting.categories.location.as_deref())
}

fn lever_to_info(posting: LeverPosting, company: &str) -> ExtractedJobInfo {
    let text = lever_text(&posting);
    let mut info = ExtractedJobInfo {
        title: Some(posting.text.clone()),
        company: Some(company_from_slug(company)),
        location: posting.categories.location.clone(),
        salary: posting
            .salary_range
            .as_ref()
            .and_then(lever_salary)
            .or_else(|| extract_salary(&text)),
        employment_type: posting
            .categories
            .commitment
            .as_deref()
            .map(|c| c.trim().to_lowercase())
            .or_else(|| extract_employment_type(&text)),
        experience_level: extract_experience_level(Some(&posting.text), &text),
        skills: extract_skills(&text),
        is_remote: lever_is_remote(&posting),
        ..Default::default()
    };

    for list in &posting.lists {
        let items = list_items(&list.content);
        match classify_list(&list.text) {
            Some(ListKind::Requirements) => info.requirements.extend(items),
            Some(ListKind::Responsibilities) => info.responsibilities.extend(items),
            Some(ListKind::Benefits) => info.benefits.extend(items),
            None => {}
        }
    }

    info.description = Some(text).filter(|t| !t.is_empty());
    info
}

fn lever_to_result(posting: LeverPosting, company: &str) -> JobResult {
    let text = lever_text(&posting);
    let to_u32 = |v: Option<f64>| v.map(|v| v.round().clamp(0.0, u32::MAX as f64) as u32);
    let (salary_min, salary_max) = posting
        .salary_range
        .as_ref()
        .map(|r| (to_u32(r.min), to_u32(r.max)))
        .unwrap_or((None, None));

    JobResult {
        is_remote: lever_is_remote(&posting),
        id: format!("lever:{}", posting.id),
        url: posting
            .hosted_url
            .unwrap_or_else(|| format!("https://jobs.lever.co/{company}/{}", posting.id)),
        title: posting.text,
        company: company_from_slug(company),
        location: posting.categories.location,
        description: Some(truncate_chars(&text, LISTING_DESCRIPTION_CHARS)).filter(|t| !t.is_empty()),
        salary_min,
        salary_max,
        source: "lever".to_string(),
        posted_at: posting.created_at.and_then(DateTime::<Utc>::from_timestamp_millis),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    pub(crate) const LEVER_ID: &str = "5ac21346-8e0c-4494-8e7a-3eb92ff77902";

    pub(crate) fn greenhouse_job_json() -> serde_json::Value {
        json!({
            "id": 4012345,
            "title": "Senior Rust Engineer",
            "location": {"name": "Remote - US"},
            "content": "&lt;p&gt;Build our ingestion platform in Rust.&lt;/p&gt;&lt;h3&gt;Responsibilities&lt;/h3&gt;&lt;ul&gt;&lt;li&gt;Own the Kafka pipeline&lt;/li&gt;&lt;li&gt;Ship weekly&lt;/li&gt;&lt;/ul&gt;&lt;h3&gt;Requirements&lt;/h3&gt;&lt;ul&gt;&lt;li&gt;5+ years of experience&lt;/li&gt;&lt;/ul&gt;&lt;p&gt;Full-time. $150,000 - $190,000 per year.&lt;/p&gt;",
            "absolute_url": "https://boards.greenhouse.io/acme/jobs/4012345",
            "updated_at": "2026-09-01T10:00:00-04:00",
            "company_name": "Acme Corp"
        })
    }

    pub(crate) fn lever_posting_json() -> serde_json::Value {
        json!({
            "id": LEVER_ID,
            "text": "Backend Engineer",
            "categories": {"location": "Toronto", "commitment": "Full-time", "team": "Platform"},
            "descriptionPlain": "Join the platform team working with Go and PostgreSQL.",
            "description": "<p>Join the platform team working with Go and PostgreSQL.</p>",
            "lists": [
                {"text": "What you'll do", "content": "<li>Design APIs</li><li>Run services</li>"},
                {"text": "Qualifications", "content": "<li>3+ years with Go</li>"},
                {"text": "Perks", "content": "<li>Remote-friendly stipend</li>"}
            ],
            "additionalPlain": "We are an equal opportunity employer.",
            "workplaceType": "hybrid",
            "hostedUrl": format!("https://jobs.lever.co/acme-robotics/{LEVER_ID}"),
            "salaryRange": {"min": 120000.0, "max": 150000.0, "currency": "CAD", "interval": "per-year-salary"},
            "createdAt": 1767225600000i64
        })
    }

    fn client_for(server: &MockServer) -> BoardClient {
        BoardClient::new(Client::new())
            .with_api_bases(format!("{}/greenhouse", server.uri()), format!("{}/lever", server.uri()))
    }

    #[test]
    fn test_company_from_slug() {
        assert_eq!(company_from_slug("acme-robotics"), "Acme Robotics");
        assert_eq!(company_from_slug("initech"), "Initech");
    }

    #[test]
    fn test_classify_list() {
        assert_eq!(classify_list("What you'll do"), Some(ListKind::Responsibilities));
        assert_eq!(classify_list("Basic Qualifications"), Some(ListKind::Requirements));
        assert_eq!(classify_list("Perks & Benefits"), Some(ListKind::Benefits));
        assert_eq!(classify_list("Our story"), None);
    }

    #[test]
    fn test_lever_salary_format() {
        let range = LeverSalaryRange {
            min: Some(120000.0),
            max: Some(150000.0),
            currency: Some("USD".to_string()),
            interval: None,
        };
        assert_eq!(lever_salary(&range).as_deref(), Some("USD 120000 - 150000"));
    }

    #[tokio::test]
    async fn test_greenhouse_posting_maps_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/greenhouse/acme/jobs/4012345"))
            .respond_with(ResponseTemplate::new(200).set_body_json(greenhouse_job_json()))
            .mount(&server)
            .await;

        let info = client_for(&server)
            .greenhouse_posting("acme", "4012345")
            .await
            .unwrap();

        assert_eq!(info.title.as_deref(), Some("Senior Rust Engineer"));
        assert_eq!(info.company.as_deref(), Some("Acme Corp"));
        assert_eq!(info.location.as_deref(), Some("Remote - US"));
        assert!(info.is_remote);
        assert_eq!(info.responsibilities, vec!["Own the Kafka pipeline", "Ship weekly"]);
        assert_eq!(info.requirements, vec!["5+ years of experience"]);
        assert_eq!(info.employment_type.as_deref(), Some("full-time"));
        assert_eq!(info.experience_level.as_deref(), Some("senior"));
        assert_eq!(info.salary.as_deref(), Some("$150,000 - $190,000 per year"));
        assert!(info.skills.contains(&"Rust".to_string()));
        assert!(info.skills.contains(&"Kafka".to_string()));
        assert!(!info.description.unwrap().contains("<p>"));
    }

    #[tokio::test]
    async fn test_lever_posting_maps_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/lever/acme-robotics/{LEVER_ID}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(lever_posting_json()))
            .mount(&server)
            .await;

        let info = client_for(&server)
            .lever_posting("acme-robotics", Uuid::parse_str(LEVER_ID).unwrap())
            .await
            .unwrap();

        assert_eq!(info.title.as_deref(), Some("Backend Engineer"));
        assert_eq!(info.company.as_deref(), Some("Acme Robotics"));
        assert_eq!(info.location.as_deref(), Some("Toronto"));
        assert_eq!(info.employment_type.as_deref(), Some("full-time"));
        assert_eq!(info.responsibilities, vec!["Design APIs", "Run services"]);
        assert_eq!(info.requirements, vec!["3+ years with Go"]);
        assert_eq!(info.benefits, vec!["Remote-friendly stipend"]);
        assert_eq!(
            info.salary.as_deref(),
            Some("CAD 120000 - 150000 (per-year-salary)")
        );
        assert!(!info.is_remote);
        assert!(info.skills.contains(&"Go".to_string()));
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .greenhouse_posting("acme", "1")
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_listings_map_to_job_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/greenhouse/acme/jobs"))
            .and(query_param("content", "true"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"jobs": [greenhouse_job_json()]})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/lever/acme-robotics"))
            .and(query_param("mode", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([lever_posting_json()])))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let gh = client.greenhouse_jobs("acme").await.unwrap();
        let lever = client.lever_jobs("acme-robotics").await.unwrap();

        assert_eq!(gh.len(), 1);
        assert_eq!(gh[0].id, "greenhouse:4012345");
        assert_eq!(gh[0].source, "greenhouse");
        assert!(gh[0].is_remote);
        assert_eq!(
            gh[0].posted_at.map(|t| t.to_rfc3339()),
            Some("2026-09-01T14:00:00+00:00".to_string())
        );

        assert_eq!(lever.len(), 1);
        assert_eq!(lever[0].id, format!("lever:{LEVER_ID}"));
        assert_eq!(lever[0].company, "Acme Robotics");
        assert_eq!(lever[0].salary_min, Some(120_000));
        assert_eq!(lever[0].salary_max, Some(150_000));
        assert!(lever[0].posted_at.is_some());
    }
}
