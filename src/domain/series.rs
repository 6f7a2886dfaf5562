use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use super::status::WatchStatus;

/// Schemaless document body as held by the store.
pub type Document = Map<String, Value>;

pub const TITLE: &str = "title";
pub const SEASONS: &str = "seasons";
pub const TOTAL_EPISODES: &str = "total_episodes";
pub const WATCHED_EPISODES: &str = "watched_episodes";
pub const STATUS: &str = "status";
pub const PERSON: &str = "person";

pub const FIELD_NAMES: [&str; 6] = [
    TITLE,
    SEASONS,
    TOTAL_EPISODES,
    WATCHED_EPISODES,
    STATUS,
    PERSON,
];

pub const NUMERIC_FIELDS: [&str; 3] = [SEASONS, TOTAL_EPISODES, WATCHED_EPISODES];

/// Data fields of a series entry, without the store identifier.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SeriesFields {
    pub title: String,
    pub seasons: u32,
    pub total_episodes: u32,
    pub watched_episodes: u32,
    pub status: WatchStatus,
    pub person: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SeriesRecord {
    pub id: String,
    #[serde(flatten)]
    pub fields: SeriesFields,
}

impl SeriesFields {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            ..Self::default()
        }
    }

    pub fn progress(&self) -> f64 {
        progress_percentage(self.watched_episodes, self.total_episodes)
    }

    /// Full document for this record. An absent person is written as `null`,
    /// which a merge update treats as removal of the field.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(TITLE.to_string(), Value::from(self.title.clone()));
        doc.insert(SEASONS.to_string(), Value::from(self.seasons));
        doc.insert(TOTAL_EPISODES.to_string(), Value::from(self.total_episodes));
        doc.insert(
            WATCHED_EPISODES.to_string(),
            Value::from(self.watched_episodes),
        );
        doc.insert(STATUS.to_string(), Value::from(self.status.as_str()));
        doc.insert(
            PERSON.to_string(),
            self.person.clone().map(Value::from).unwrap_or(Value::Null),
        );
        doc
    }

    /// Reads a stored document leniently. Imported rows may carry numbers as
    /// text, unknown statuses, or no value at all.
    pub fn from_document(id: &str, doc: &Document) -> Self {
        let status = match doc.get(STATUS) {
            None | Some(Value::Null) => WatchStatus::default(),
            Some(value) => {
                let raw = text_value(value).unwrap_or_default();
                WatchStatus::from_str(&raw).unwrap_or_else(|err| {
                    warn!(id, error = %err, "unknown status in stored document");
                    WatchStatus::default()
                })
            }
        };

        Self {
            title: doc.get(TITLE).and_then(text_value).unwrap_or_default(),
            seasons: count_field(id, doc, SEASONS),
            total_episodes: count_field(id, doc, TOTAL_EPISODES),
            watched_episodes: count_field(id, doc, WATCHED_EPISODES),
            status,
            person: doc
                .get(PERSON)
                .and_then(text_value)
                .filter(|person| !person.trim().is_empty()),
        }
    }
}

impl SeriesRecord {
    pub fn from_document(id: &str, doc: &Document) -> Self {
        Self {
            id: id.to_string(),
            fields: SeriesFields::from_document(id, doc),
        }
    }

    pub fn progress(&self) -> f64 {
        self.fields.progress()
    }
}

/// Percentage of watched episodes rounded to two decimals; zero when the
/// total is unknown.
pub fn progress_percentage(watched: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = f64::from(watched) / f64::from(total) * 100.0;
    (raw * 100.0).round() / 100.0
}

pub fn format_percentage(value: f64) -> String {
    format!("{value:.2}")
}

/// Parses a count from user or file input.
pub fn parse_count(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok()
}

fn count_field(id: &str, doc: &Document, field: &str) -> u32 {
    let Some(value) = doc.get(field) else {
        return 0;
    };
    let parsed = match value {
        Value::Null => return 0,
        Value::Number(number) => number
            .as_u64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|float| *float >= 0.0 && float.fract() == 0.0)
                    .map(|float| float as u64)
            })
            .and_then(|count| u32::try_from(count).ok()),
        Value::String(text) if text.trim().is_empty() => return 0,
        Value::String(text) => parse_count(text),
        _ => None,
    };
    parsed.unwrap_or_else(|| {
        warn!(id, field, value = %value, "unreadable count in stored document");
        0
    })
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
