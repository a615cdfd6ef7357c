use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::date;

/// Default title for articles the scraper could not title.
pub const DEFAULT_TITLE: &str = "No Title";

/// A source article as stored by the ingestion service.
///
/// Created by an external ingestion process; the worker only reads it and
/// flips the per-task status flag. `url` is required for processing but the
/// store cannot guarantee it, so absence is a per-document error.
#[derive(Debug, Clone)]
pub struct NewsDocument {
    pub id: i64,
    pub content: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub published_at: Option<PublishDate>,
}

impl NewsDocument {
    pub fn title_or_default(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| DEFAULT_TITLE.to_string())
    }

    /// Canonical day-granularity publish date string: structured timestamps
    /// are formatted, raw strings pass through as-is, a missing date means
    /// "published now". Raw strings are validated later, when converted to
    /// epoch seconds.
    pub fn publish_day(&self) -> String {
        match &self.published_at {
            Some(PublishDate::Timestamp(ts)) => date::day_string(ts),
            Some(PublishDate::Raw(s)) => s.clone(),
            None => date::today(),
        }
    }
}

/// Publish dates arrive from scrapers either as structured timestamps or as
/// free-form strings; both shapes survive until normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishDate {
    Timestamp(DateTime<Utc>),
    Raw(String),
}

impl PublishDate {
    /// Classify a stored value: RFC 3339 and `T`- or space-separated naive
    /// timestamps count as structured, anything else stays raw.
    pub fn parse(value: &str) -> Self {
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return PublishDate::Timestamp(dt.with_timezone(&Utc));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
                return PublishDate::Timestamp(naive.and_utc());
            }
        }
        PublishDate::Raw(value.to_string())
    }
}

/// Per-(document, task) processing flag.
///
/// The only legal transition is `Unset -> Complete`, applied exactly once per
/// successful full processing. There is no failed state: any failure leaves
/// the flag unset, indistinguishable from "never attempted", so the document
/// is naturally re-offered on a later cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    Unset,
    Complete,
}

impl TaskStatus {
    pub const fn as_i32(self) -> i32 {
        match self {
            TaskStatus::Unset => 0,
            TaskStatus::Complete => 1,
        }
    }

    pub const fn from_i32(value: i32) -> Self {
        match value {
            1 => TaskStatus::Complete,
            _ => TaskStatus::Unset,
        }
    }

    pub const fn is_complete(self) -> bool {
        matches!(self, TaskStatus::Complete)
    }
}

/// Payload stored alongside each embedding in the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub title: String,
    pub url: String,
    /// Epoch seconds, truncated to day granularity.
    pub publish_date: i64,
}

/// One ranked hit from a similarity search. `id` is the record's URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub id: String,
    pub distance: f32,
    pub metadata: RecordMetadata,
}

/// A stored record close enough to a query embedding to count as a
/// near-duplicate of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateCandidate {
    pub metadata: RecordMetadata,
    pub distance: f32,
}
