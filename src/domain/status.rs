use std::error::Error;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WatchStatus {
    #[serde(rename = "Completed")]
    Completed,
    #[serde(rename = "Watching")]
    Watching,
    #[serde(rename = "On Hold")]
    OnHold,
    #[serde(rename = "Dropped")]
    Dropped,
    #[default]
    #[serde(rename = "Plan to watch")]
    PlanToWatch,
}

impl WatchStatus {
    pub const ALL: [WatchStatus; 5] = [
        WatchStatus::Completed,
        WatchStatus::Watching,
        WatchStatus::OnHold,
        WatchStatus::Dropped,
        WatchStatus::PlanToWatch,
    ];

    /// Name stored in documents and written to CSV exports.
    pub fn as_str(self) -> &'static str {
        match self {
            WatchStatus::Completed => "Completed",
            WatchStatus::Watching => "Watching",
            WatchStatus::OnHold => "On Hold",
            WatchStatus::Dropped => "Dropped",
            WatchStatus::PlanToWatch => "Plan to watch",
        }
    }
}

impl fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WatchStatus {
    type Err = ParseWatchStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value
            .trim()
            .to_ascii_lowercase()
            .replace(['-', '_'], " ");
        let status = match normalized.as_str() {
            "completed" | "complete" | "done" => WatchStatus::Completed,
            "watching" => WatchStatus::Watching,
            "on hold" | "onhold" | "paused" => WatchStatus::OnHold,
            "dropped" => WatchStatus::Dropped,
            "plan to watch" | "planned" | "plan" => WatchStatus::PlanToWatch,
            _ => {
                return Err(ParseWatchStatusError {
                    value: value.to_string(),
                });
            }
        };

        Ok(status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWatchStatusError {
    value: String,
}

impl fmt::Display for ParseWatchStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid watch status '{}': expected one of {}",
            self.value,
            WatchStatus::ALL
                .iter()
                .map(|status| status.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl Error for ParseWatchStatusError {}
