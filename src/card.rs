use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::app::AppError;
use crate::domain::series::{self, parse_count, SeriesFields, SeriesRecord};
use crate::domain::status::WatchStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardMode {
    Viewing,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Title,
    Seasons,
    TotalEpisodes,
    WatchedEpisodes,
    Status,
    Person,
}

impl EditField {
    pub fn as_str(self) -> &'static str {
        match self {
            EditField::Title => series::TITLE,
            EditField::Seasons => series::SEASONS,
            EditField::TotalEpisodes => series::TOTAL_EPISODES,
            EditField::WatchedEpisodes => series::WATCHED_EPISODES,
            EditField::Status => series::STATUS,
            EditField::Person => series::PERSON,
        }
    }
}

impl fmt::Display for EditField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The one record currently open for editing, with its uncommitted copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    id: String,
    buffer: SeriesFields,
}

impl EditSession {
    pub fn begin(record: &SeriesRecord) -> Self {
        Self {
            id: record.id.clone(),
            buffer: record.fields.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn buffer(&self) -> &SeriesFields {
        &self.buffer
    }

    pub fn staged_record(&self) -> SeriesRecord {
        SeriesRecord {
            id: self.id.clone(),
            fields: self.buffer.clone(),
        }
    }

    /// Stages one field from text input. Invalid input leaves the buffer
    /// untouched.
    pub fn set_field(&mut self, field: EditField, raw: &str) -> Result<(), AppError> {
        match field {
            EditField::Title => {
                let title = raw.trim();
                if title.is_empty() {
                    return Err(AppError::InvalidArgument(
                        "title cannot be empty".to_string(),
                    ));
                }
                self.buffer.title = title.to_string();
            }
            EditField::Seasons => self.buffer.seasons = count_input(field, raw)?,
            EditField::TotalEpisodes => self.buffer.total_episodes = count_input(field, raw)?,
            EditField::WatchedEpisodes => self.buffer.watched_episodes = count_input(field, raw)?,
            EditField::Status => self.buffer.status = WatchStatus::from_str(raw)?,
            EditField::Person => {
                let person = raw.trim();
                self.buffer.person = if person.is_empty() {
                    None
                } else {
                    Some(person.to_string())
                };
            }
        }
        Ok(())
    }

    pub(crate) fn mirror_watched(&mut self, watched: u32) {
        self.buffer.watched_episodes = watched;
    }

    pub(crate) fn mirror_status(&mut self, status: WatchStatus) {
        self.buffer.status = status;
    }
}

/// Watched count after one increment, or `None` when the record is already
/// complete.
pub fn next_watched(fields: &SeriesFields) -> Option<u32> {
    let next = fields
        .watched_episodes
        .saturating_add(1)
        .min(fields.total_episodes);
    (next != fields.watched_episodes).then_some(next)
}

fn count_input(field: EditField, raw: &str) -> Result<u32, AppError> {
    parse_count(raw).ok_or_else(|| {
        AppError::InvalidArgument(format!(
            "{} must be a non-negative whole number, got '{}'",
            field, raw
        ))
    })
}
