//! Regex and keyword extraction used when the model tier is unavailable.
//!
//! Each extractor is independent and may come back empty; none of them is
//! required to succeed.

use std::sync::LazyLock;

use regex::Regex;

use crate::jobs::models::ExtractedJobInfo;

const MAX_SECTION_ITEMS: usize = 15;
const MAX_DESCRIPTION_CHARS: usize = 2000;

static LABELED_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?:job\s+title|position|role)\s*[:\-–]\s*(.{3,120}?)\s*$")
        .expect("valid title regex")
});
static ROLE_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:engineer|developer|manager|designer|analyst|scientist|specialist|coordinator|director|architect|consultant|administrator|intern|associate|representative|officer|lead|recruiter|writer|accountant|nurse|technician)\b")
        .expect("valid role-word regex")
});
static LABELED_COMPANY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?:company|employer|organization)\s*[:\-–]\s*(.{2,80}?)\s*$")
        .expect("valid company regex")
});
static ABOUT_COMPANY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:About|Join)[ \t]+([A-Z][A-Za-z0-9&.'\-]*(?:[ \t]+[A-Z][A-Za-z0-9&.'\-]*){0,3})[ \t]*[:!.]?[ \t]*$")
        .expect("valid about regex")
});
static LABELED_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?:location|based in|office)\s*[:\-–]\s*(.{2,100}?)\s*$")
        .expect("valid location regex")
});
static SALARY: LazyLock<Regex> = LazyLock::new(|| {
    let amount = r"[$€£]\s?\d{1,3}(?:,\d{3})+(?:\.\d{2})?|[$€£]\s?\d+(?:\.\d+)?\s?[kK]|[$€£]\s?\d{2,7}";
    Regex::new(&format!(
        r"(?:{amount})(?:\s*(?:-|–|—|to)\s*(?:{amount}))?(?:\s*(?:per|/)\s*(?:year|yr|annum|hour|hr|month))?"
    ))
    .expect("valid salary regex")
});
static REMOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bremote\b").expect("valid remote regex"));
static YEARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\+?\s*(?:-\s*\d{1,2}\s*)?(?:years|yrs)\b").expect("valid years regex")
});
static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-•*·▪◦]|\d{1,2}[.)])\s+").expect("valid list-marker regex")
});

const EMPLOYMENT_TYPES: &[(&str, &str)] = &[
    (r"(?i)\bfull[- ]time\b", "full-time"),
    (r"(?i)\bpart[- ]time\b", "part-time"),
    (r"(?i)\bcontract(?:or)?\b", "contract"),
    (r"(?i)\binternship\b", "internship"),
    (r"(?i)\btemporary\b", "temporary"),
];

static EMPLOYMENT_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    EMPLOYMENT_TYPES
        .iter()
        .map(|(p, label)| (Regex::new(p).expect("valid employment regex"), *label))
        .collect()
});

const LEVEL_KEYWORDS: &[(&str, &str)] = &[
    (r"(?i)\b(?:director|vp|head of)\b", "executive"),
    (r"(?i)\b(?:principal|staff|lead)\b", "lead"),
    (r"(?i)\b(?:senior|sr\.?)\b", "senior"),
    (r"(?i)\b(?:mid[- ]level|intermediate)\b", "mid"),
    (r"(?i)\b(?:junior|jr\.?|entry[- ]level|graduate|intern)\b", "entry"),
];

static LEVEL_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    LEVEL_KEYWORDS
        .iter()
        .map(|(p, label)| (Regex::new(p).expect("valid level regex"), *label))
        .collect()
});

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Requirements,
    Responsibilities,
    Benefits,
    Other,
}

static SECTION_HEADINGS: LazyLock<Vec<(Regex, Section)>> = LazyLock::new(|| {
    [
        (
            r"(?i)^(?:requirements|qualifications|minimum qualifications|basic qualifications|preferred qualifications|what you(?:'ll)? (?:need|bring)|who you are|you have|must haves?|skills (?:and|&) experience)\b",
            Section::Requirements,
        ),
        (
            r"(?i)^(?:responsibilities|key responsibilities|what you(?:'ll)? do|your role|duties|in this role you will|the role)\b",
            Section::Responsibilities,
        ),
        (
            r"(?i)^(?:benefits|perks|what we offer|compensation (?:and|&) benefits)\b",
            Section::Benefits,
        ),
        (
            r"(?i)^(?:about (?:us|the company|the team|you)|how to apply|equal opportunity)\b",
            Section::Other,
        ),
    ]
    .into_iter()
    .map(|(p, s)| (Regex::new(p).expect("valid heading regex"), s))
    .collect()
});

/// Skill name as reported, whether matching is case-sensitive, and the
/// literal to look for. Short or common-English names match case-sensitively.
const SKILLS: &[(&str, bool, &str)] = &[
    ("Rust", false, "rust"),
    ("Python", false, "python"),
    ("JavaScript", false, "javascript"),
    ("TypeScript", false, "typescript"),
    ("Java", false, "java"),
    ("Go", true, "Go"),
    ("Golang", false, "golang"),
    ("C++", false, "c++"),
    ("C#", false, "c#"),
    ("Ruby", false, "ruby"),
    ("PHP", false, "php"),
    ("Kotlin", false, "kotlin"),
    ("Swift", true, "Swift"),
    ("Scala", false, "scala"),
    ("SQL", false, "sql"),
    ("PostgreSQL", false, "postgresql"),
    ("MySQL", false, "mysql"),
    ("MongoDB", false, "mongodb"),
    ("Redis", false, "redis"),
    ("React", false, "react"),
    ("Vue", false, "vue"),
    ("Angular", false, "angular"),
    ("Node.js", false, "node.js"),
    ("Django", false, "django"),
    ("Flask", true, "Flask"),
    ("Spring", true, "Spring"),
    ("Rails", true, "Rails"),
    ("GraphQL", false, "graphql"),
    ("REST", true, "REST"),
    ("AWS", false, "aws"),
    ("GCP", false, "gcp"),
    ("Azure", false, "azure"),
    ("Docker", false, "docker"),
    ("Kubernetes", false, "kubernetes"),
    ("Terraform", false, "terraform"),
    ("Kafka", false, "kafka"),
    ("Spark", true, "Spark"),
    ("Git", true, "Git"),
    ("Linux", false, "linux"),
    ("CI/CD", false, "ci/cd"),
    ("Machine Learning", false, "machine learning"),
    ("TensorFlow", false, "tensorflow"),
    ("PyTorch", false, "pytorch"),
    ("Figma", false, "figma"),
    ("Excel", true, "Excel"),
    ("Tableau", false, "tableau"),
];

static SKILL_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    SKILLS
        .iter()
        .map(|(name, case_sensitive, literal)| {
            let flags = if *case_sensitive { "" } else { "(?i)" };
            let pattern = format!(
                r"{flags}(?:^|[^A-Za-z0-9+#/]){}(?:$|[^A-Za-z0-9+#/])",
                regex::escape(literal)
            );
            (*name, Regex::new(&pattern).expect("valid skill regex"))
        })
        .collect()
});

/// Runs every heuristic over plain `text` and assembles the result.
pub fn extract_with_heuristics(text: &str) -> ExtractedJobInfo {
    let title = extract_title(text);
    let is_remote = REMOTE.is_match(text);
    let location = extract_location(text).or_else(|| is_remote.then(|| "Remote".to_string()));
    let (requirements, responsibilities, benefits) = extract_sections(text);

    ExtractedJobInfo {
        experience_level: extract_experience_level(title.as_deref(), text),
        title,
        company: extract_company(text),
        location,
        salary: extract_salary(text),
        description: Some(truncate_chars(text.trim(), MAX_DESCRIPTION_CHARS)).filter(|d| !d.is_empty()),
        requirements,
        responsibilities,
        benefits,
        employment_type: extract_employment_type(text),
        skills: extract_skills(text),
        is_remote,
    }
}

pub fn extract_title(text: &str) -> Option<String> {
    if let Some(caps) = LABELED_TITLE.captures(text) {
        return Some(caps[1].to_string());
    }
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(10)
        .find(|l| l.chars().count() <= 100 && !LIST_MARKER.is_match(l) && ROLE_WORDS.is_match(l))
        .map(String::from)
}

pub fn extract_company(text: &str) -> Option<String> {
    if let Some(caps) = LABELED_COMPANY.captures(text) {
        return Some(caps[1].to_string());
    }
    ABOUT_COMPANY
        .captures_iter(text)
        .map(|caps| caps[1].trim().to_string())
        .find(|name| {
            let first = name.split_whitespace().next().unwrap_or_default();
            !matches!(first, "Us" | "The" | "You" | "This" | "Our")
        })
}

pub fn extract_location(text: &str) -> Option<String> {
    LABELED_LOCATION
        .captures(text)
        .map(|caps| caps[1].to_string())
}

pub fn extract_salary(text: &str) -> Option<String> {
    SALARY.find(text).map(|m| m.as_str().trim().to_string())
}

pub fn extract_employment_type(text: &str) -> Option<String> {
    EMPLOYMENT_PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, label)| label.to_string())
}

/// Title keywords win, then "N+ years" phrases, then keywords anywhere.
pub fn extract_experience_level(title: Option<&str>, text: &str) -> Option<String> {
    let by_keyword = |haystack: &str| {
        LEVEL_PATTERNS
            .iter()
            .find(|(re, _)| re.is_match(haystack))
            .map(|(_, label)| label.to_string())
    };

    if let Some(level) = title.and_then(by_keyword) {
        return Some(level);
    }

    let by_years = YEARS
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .max()
        .map(|years| match years {
            0..=2 => "entry",
            3..=5 => "mid",
            _ => "senior",
        });
    if let Some(level) = by_years {
        return Some(level.to_string());
    }

    by_keyword(text)
}

pub fn extract_skills(text: &str) -> Vec<String> {
    SKILL_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(name, _)| name.to_string())
        .collect()
}

fn heading_of(line: &str) -> Option<Section> {
    SECTION_HEADINGS
        .iter()
        .find(|(re, _)| re.is_match(line))
        .map(|(_, section)| *section)
}

fn looks_like_heading(line: &str) -> bool {
    line.ends_with(':') && line.chars().count() <= 60 && !LIST_MARKER.is_match(line)
}

/// Requirements, responsibilities and benefits listed under recognised headings.
pub fn extract_sections(text: &str) -> (Vec<String>, Vec<String>, Vec<String>) {
    (
        extract_section(text, Section::Requirements),
        extract_section(text, Section::Responsibilities),
        extract_section(text, Section::Benefits),
    )
}

/// Collects the lines under every heading of `wanted`. A section ends at
/// the next heading, or at the first plain line after a bulleted list.
fn extract_section(text: &str, wanted: Section) -> Vec<String> {
    let mut items = Vec::new();
    let mut inside = false;
    let mut in_list = false;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(section) = heading_of(line) {
            inside = section == wanted;
            in_list = false;
            continue;
        }
        if looks_like_heading(line) {
            inside = false;
            continue;
        }
        if !inside {
            continue;
        }

        let bulleted = LIST_MARKER.is_match(line);
        if in_list && !bulleted {
            inside = false;
            continue;
        }
        in_list |= bulleted;

        let item = LIST_MARKER.replace(line, "").trim().to_string();
        if item.chars().count() >= 3 {
            items.push(item);
        }
        if items.len() >= MAX_SECTION_ITEMS {
            break;
        }
    }

    items
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POSTING: &str = "Senior Backend Engineer
Location: Berlin, Germany (Hybrid)
Full-time

About Acme Robotics

We build warehouse robots.

Responsibilities:
- Design and operate Rust services
- Own the PostgreSQL data model
- Mentor other engineers

Requirements:
- 5+ years of backend experience
- Strong knowledge of Rust or Go
- Experience with Kubernetes and AWS

Benefits:
- 30 days vacation
- Learning budget

Salary: $120,000 - $150,000 per year";

    #[test]
    fn test_extracts_core_fields() {
        let info = extract_with_heuristics(POSTING);
        assert_eq!(info.title.as_deref(), Some("Senior Backend Engineer"));
        assert_eq!(info.company.as_deref(), Some("Acme Robotics"));
        assert_eq!(info.location.as_deref(), Some("Berlin, Germany (Hybrid)"));
        assert_eq!(info.salary.as_deref(), Some("$120,000 - $150,000 per year"));
        assert_eq!(info.employment_type.as_deref(), Some("full-time"));
        assert_eq!(info.experience_level.as_deref(), Some("senior"));
        assert!(!info.is_remote);
    }

    #[test]
    fn test_extracts_sections() {
        let info = extract_with_heuristics(POSTING);
        assert_eq!(
            info.responsibilities,
            vec![
                "Design and operate Rust services",
                "Own the PostgreSQL data model",
                "Mentor other engineers"
            ]
        );
        assert_eq!(info.requirements.len(), 3);
        assert_eq!(info.requirements[0], "5+ years of backend experience");
        assert_eq!(info.benefits, vec!["30 days vacation", "Learning budget"]);
    }

    #[test]
    fn test_extracts_skills() {
        let skills = extract_skills(POSTING);
        for expected in ["Rust", "Go", "PostgreSQL", "Kubernetes", "AWS"] {
            assert!(skills.contains(&expected.to_string()), "missing {expected}");
        }
        assert!(!skills.contains(&"Java".to_string()));
    }

    #[test]
    fn test_skill_matching_respects_boundaries() {
        assert!(extract_skills("We love JavaScript").contains(&"JavaScript".to_string()));
        assert!(!extract_skills("We love JavaScript").contains(&"Java".to_string()));
        assert!(extract_skills("Modern C++ and C#").contains(&"C++".to_string()));
        assert!(!extract_skills("let's go ship it").contains(&"Go".to_string()));
    }

    #[test]
    fn test_every_field_optional() {
        let info = extract_with_heuristics("just some words that say nothing in particular here");
        assert!(info.title.is_none());
        assert!(info.company.is_none());
        assert!(info.salary.is_none());
        assert!(info.requirements.is_empty());
        assert!(info.skills.is_empty());
        assert!(info.description.is_some());
    }

    #[test]
    fn test_remote_sets_location_when_unlabeled() {
        let info = extract_with_heuristics("Staff Data Engineer\nThis is a fully remote role.");
        assert!(info.is_remote);
        assert_eq!(info.location.as_deref(), Some("Remote"));
        assert_eq!(info.experience_level.as_deref(), Some("lead"));
    }

    #[test]
    fn test_experience_level_from_years() {
        assert_eq!(
            extract_experience_level(Some("Backend Engineer"), "You have 1-2 years of experience").as_deref(),
            Some("entry")
        );
        assert_eq!(
            extract_experience_level(None, "4+ years building APIs").as_deref(),
            Some("mid")
        );
        assert_eq!(extract_experience_level(None, "no signal here"), None);
    }

    #[test]
    fn test_salary_variants() {
        assert_eq!(extract_salary("Pay: $90k-$110k").as_deref(), Some("$90k-$110k"));
        assert_eq!(extract_salary("€55,000 to €65,000").as_deref(), Some("€55,000 to €65,000"));
        assert_eq!(extract_salary("$45/hour").as_deref(), Some("$45/hour"));
        assert_eq!(extract_salary("competitive pay"), None);
    }

    #[test]
    fn test_labeled_fields_take_precedence() {
        let text = "Job Title: Platform Engineer\nCompany: Initech\nLocation - Austin, TX";
        assert_eq!(extract_title(text).as_deref(), Some("Platform Engineer"));
        assert_eq!(extract_company(text).as_deref(), Some("Initech"));
        assert_eq!(extract_location(text).as_deref(), Some("Austin, TX"));
    }

    #[test]
    fn test_about_us_is_not_a_company() {
        assert_eq!(extract_company("About Us\nWe are great."), None);
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
