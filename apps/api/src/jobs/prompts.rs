// Prompt constants for job posting extraction.

/// System prompt for posting extraction. Enforces JSON-only output.
pub const EXTRACT_JOB_SYSTEM: &str = "You are an expert recruiter who reads job postings \
    and extracts structured facts from them. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT invent details that are not stated in the posting.";

/// Extraction prompt template. Replace `{job_text}` before sending.
pub const EXTRACT_JOB_PROMPT_TEMPLATE: &str = r#"Extract the job posting below into a JSON object with this EXACT schema (no extra fields):
{
  "title": "Senior Backend Engineer",
  "company": "Acme Robotics",
  "location": "Berlin, Germany",
  "salary": "$120,000 - $150,000 per year",
  "description": "Two or three sentence summary of the role",
  "requirements": ["5+ years of backend experience"],
  "responsibilities": ["Design and operate Rust services"],
  "benefits": ["30 days vacation"],
  "employment_type": "full-time",
  "experience_level": "senior",
  "skills": ["Rust", "PostgreSQL"],
  "is_remote": false
}

Rules:
- Use null for any scalar field the posting does not state, and [] for any list it does not state.
- "employment_type" is one of: "full-time", "part-time", "contract", "internship", "temporary", or null.
- "experience_level" is one of: "entry", "mid", "senior", "lead", "executive", or null.
- "is_remote" is true only if the posting says the role can be done fully remotely.
- Keep list items short: one requirement, responsibility, or benefit per item.
- "skills" lists concrete technologies, tools, and methodologies only.

JOB POSTING:
{job_text}"#;
