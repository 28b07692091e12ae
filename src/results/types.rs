//! Job record and outcome type definitions

use crate::error::ErrorKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single job posting returned by an adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Job title
    pub title: String,
    /// Hiring company
    pub company: String,
    /// Posting location (free-form, often "Remote")
    pub location: String,
    /// Salary text, when the source exposes one
    pub salary: Option<String>,
    /// Description snippet
    pub snippet: Option<String>,
    /// URL of the posting at the source
    pub url: String,
    /// Adapter that produced this record
    pub source: String,
    /// Skill tags carried by the source
    #[serde(default)]
    pub skill_tags: Vec<String>,
    /// When the record was scraped
    pub retrieved_at: DateTime<Utc>,
}

impl JobRecord {
    /// Create a new record. The source adapter name and retrieval timestamp
    /// are set here so every record carries both.
    pub fn new(
        title: impl Into<String>,
        company: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        let source = source.into();
        debug_assert!(!source.is_empty(), "record without a source adapter");
        Self {
            title: title.into(),
            company: company.into(),
            location: String::new(),
            salary: None,
            snippet: None,
            url: String::new(),
            source,
            skill_tags: Vec::new(),
            retrieved_at: Utc::now(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_salary(mut self, salary: impl Into<String>) -> Self {
        self.salary = Some(salary.into());
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.skill_tags = tags;
        self
    }

    /// Composite dedup key: normalized (title, company)
    pub fn dedup_key(&self) -> String {
        format!("{}|{}", normalize(&self.title), normalize(&self.company))
    }
}

/// Lowercase with whitespace runs collapsed to single spaces
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Requested experience band for filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
    Executive,
    #[default]
    All,
}

impl ExperienceLevel {
    /// Phrases indicating a title/description belongs to this band
    pub fn indicators(&self) -> &'static [&'static str] {
        match self {
            Self::Entry => &["entry", "junior", "associate", "intern", "new grad"],
            Self::Mid => &["mid", "intermediate", "professional"],
            Self::Senior => &["senior", "lead", "principal", "staff"],
            Self::Executive => &["director", "vp", "chief", "head of", "manager"],
            Self::All => &[],
        }
    }

    /// Substring match over title concatenated with the snippet
    pub fn matches(&self, record: &JobRecord) -> bool {
        if *self == Self::All {
            return true;
        }
        let haystack = format!(
            "{} {}",
            record.title,
            record.snippet.as_deref().unwrap_or("")
        )
        .to_lowercase();
        self.indicators()
            .iter()
            .any(|phrase| haystack.contains(phrase))
    }
}

impl std::str::FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "entry" => Ok(Self::Entry),
            "mid" => Ok(Self::Mid),
            "senior" => Ok(Self::Senior),
            "executive" => Ok(Self::Executive),
            "all" | "" => Ok(Self::All),
            other => Err(format!("unknown experience level: {}", other)),
        }
    }
}

/// Per-adapter result summary attached to every search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterOutcome {
    /// Adapter name
    pub adapter: String,
    /// Records contributed before dedup
    pub count: usize,
    /// Wall-clock time the adapter spent
    pub duration_ms: u64,
    /// Failure detail, when the adapter did not complete cleanly
    pub error: Option<OutcomeError>,
}

impl AdapterOutcome {
    pub fn success(adapter: impl Into<String>, count: usize, duration_ms: u64) -> Self {
        Self {
            adapter: adapter.into(),
            count,
            duration_ms,
            error: None,
        }
    }

    pub fn failure(
        adapter: impl Into<String>,
        duration_ms: u64,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            adapter: adapter.into(),
            count: 0,
            duration_ms,
            error: Some(OutcomeError {
                kind,
                message: message.into(),
            }),
        }
    }
}

/// The error half of an outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeError {
    pub kind: ErrorKind,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_key_normalization() {
        let a = JobRecord::new("Senior  Engineer", "ACME Corp", "remoteok");
        let b = JobRecord::new("senior engineer", "acme   corp", "indeed");
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_dedup_key_distinguishes_company() {
        let a = JobRecord::new("Engineer", "Acme", "remoteok");
        let b = JobRecord::new("Engineer", "Beta", "remoteok");
        assert_ne!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_record_always_carries_source_and_timestamp() {
        let record = JobRecord::new("Engineer", "Acme", "remoteok");
        assert!(!record.source.is_empty());
        assert!(record.retrieved_at <= Utc::now());
    }

    #[test]
    fn test_experience_filter() {
        let senior = JobRecord::new("Senior Backend Engineer", "Acme", "remoteok");

        assert!(!ExperienceLevel::Entry.matches(&senior));
        assert!(ExperienceLevel::Senior.matches(&senior));
        assert!(ExperienceLevel::All.matches(&senior));
    }

    #[test]
    fn test_experience_filter_reads_snippet() {
        let record = JobRecord::new("Backend Engineer", "Acme", "remoteok")
            .with_snippet("Great role for a new grad looking to learn");
        assert!(ExperienceLevel::Entry.matches(&record));
    }

    #[test]
    fn test_experience_level_parse() {
        assert_eq!("senior".parse::<ExperienceLevel>(), Ok(ExperienceLevel::Senior));
        assert_eq!("ALL".parse::<ExperienceLevel>(), Ok(ExperienceLevel::All));
        assert!("wizard".parse::<ExperienceLevel>().is_err());
    }
}
