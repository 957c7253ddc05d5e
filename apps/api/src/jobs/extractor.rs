//! Text-to-structure extraction with an ordered fallback chain:
//! the model tier first, regex heuristics last.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::jobs::heuristics::{extract_with_heuristics, truncate_chars};
use crate::jobs::models::ExtractedJobInfo;
use crate::jobs::prompts::{EXTRACT_JOB_PROMPT_TEMPLATE, EXTRACT_JOB_SYSTEM};
use crate::llm_client::{LlmClient, LlmError};

/// Shorter text is not worth a model call.
pub const MIN_EXTRACT_TEXT_LEN: usize = 50;
/// Upper bound accepted from API callers.
pub const MAX_EXTRACT_TEXT_LEN: usize = 50_000;
/// Characters of posting text sent to the model.
pub const LLM_TEXT_BUDGET: usize = 15_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionTier {
    GreenhouseApi,
    LeverApi,
    Llm,
    Heuristics,
}

/// Outcome of one fallback tier.
#[derive(Debug)]
pub enum ExtractionAttempt {
    Extracted {
        tier: ExtractionTier,
        info: ExtractedJobInfo,
    },
    /// The tier does not apply to this input.
    NoMatch,
    /// The tier applied but produced nothing usable.
    Failed(String),
}

/// Structured-output model seam. `LlmJobModel` in production; tests count calls.
#[async_trait]
pub trait JobInfoModel: Send + Sync {
    async fn extract(&self, text: &str) -> Result<ExtractedJobInfo, LlmError>;
}

pub struct LlmJobModel(pub LlmClient);

#[async_trait]
impl JobInfoModel for LlmJobModel {
    async fn extract(&self, text: &str) -> Result<ExtractedJobInfo, LlmError> {
        let prompt = EXTRACT_JOB_PROMPT_TEMPLATE.replace("{job_text}", text);
        self.0.call_json::<ExtractedJobInfo>(&prompt, EXTRACT_JOB_SYSTEM).await
    }
}

const TEXT_TIERS: [ExtractionTier; 2] = [ExtractionTier::Llm, ExtractionTier::Heuristics];

#[derive(Clone, Default)]
pub struct JobExtractor {
    model: Option<Arc<dyn JobInfoModel>>,
}

impl JobExtractor {
    pub fn new(model: Option<Arc<dyn JobInfoModel>>) -> Self {
        Self { model }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Extracts structured fields from plain posting text. Returns `None`
    /// for text under `MIN_EXTRACT_TEXT_LEN` characters without calling
    /// the model.
    pub async fn extract_job_info(&self, text: &str) -> Option<ExtractedJobInfo> {
        self.extract_with_tier(text).await.map(|(_, info)| info)
    }

    /// Like `extract_job_info`, also reporting which tier produced the result.
    pub async fn extract_with_tier(&self, text: &str) -> Option<(ExtractionTier, ExtractedJobInfo)> {
        let text = text.trim();
        if text.chars().count() < MIN_EXTRACT_TEXT_LEN {
            debug!("Skipping extraction: text shorter than {MIN_EXTRACT_TEXT_LEN} chars");
            return None;
        }

        for tier in TEXT_TIERS {
            match self.attempt(tier, text).await {
                ExtractionAttempt::Extracted { tier, info } => {
                    debug!("Extracted job info via {tier:?}");
                    return Some((tier, info));
                }
                ExtractionAttempt::NoMatch => {}
                ExtractionAttempt::Failed(reason) => {
                    warn!("Extraction tier {tier:?} failed, falling back: {reason}");
                }
            }
        }

        None
    }

    async fn attempt(&self, tier: ExtractionTier, text: &str) -> ExtractionAttempt {
        match tier {
            ExtractionTier::Llm => self.attempt_model(text).await,
            ExtractionTier::Heuristics => ExtractionAttempt::Extracted {
                tier,
                info: extract_with_heuristics(text),
            },
            ExtractionTier::GreenhouseApi | ExtractionTier::LeverApi => ExtractionAttempt::NoMatch,
        }
    }

    async fn attempt_model(&self, text: &str) -> ExtractionAttempt {
        let Some(model) = self.model.as_ref() else {
            return ExtractionAttempt::NoMatch;
        };

        let budgeted = truncate_chars(text, LLM_TEXT_BUDGET);
        match model.extract(&budgeted).await {
            Ok(info) if info.title.as_deref().is_some_and(|t| !t.trim().is_empty()) => {
                ExtractionAttempt::Extracted {
                    tier: ExtractionTier::Llm,
                    info,
                }
            }
            Ok(_) => ExtractionAttempt::Failed("model returned no title".to_string()),
            Err(e) => ExtractionAttempt::Failed(e.to_string()),
        }
    }
}
