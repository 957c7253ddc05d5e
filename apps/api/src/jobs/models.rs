use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemotePreference {
    Remote,
    Hybrid,
    Onsite,
    #[default]
    Any,
}

/// Search filters submitted by a user. List fields are unordered sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobSearchParams {
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub remote_preference: Option<RemotePreference>,
    pub salary_min: Option<u32>,
    pub salary_max: Option<u32>,
}

/// A discovered job posting in the shape shared by all sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub url: String,
    pub description: Option<String>,
    pub salary_min: Option<u32>,
    pub salary_max: Option<u32>,
    pub is_remote: bool,
    pub source: String,
    pub posted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedJobData {
    pub jobs: Vec<JobResult>,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub source_counts: BTreeMap<String, u32>,
    pub search_params: JobSearchParams,
}

/// Structured fields pulled out of a job posting. Every field is optional:
/// extraction is best-effort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedJobInfo {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub description: Option<String>,
    pub requirements: Vec<String>,
    pub responsibilities: Vec<String>,
    pub benefits: Vec<String>,
    pub employment_type: Option<String>,
    pub experience_level: Option<String>,
    pub skills: Vec<String>,
    pub is_remote: bool,
}
