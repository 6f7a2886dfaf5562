use std::cmp::Ordering;
use std::error::Error;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::domain::series::SeriesRecord;
use crate::domain::status::WatchStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ParseSortOrderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "a-z" => Ok(SortOrder::Asc),
            "desc" | "descending" | "z-a" => Ok(SortOrder::Desc),
            _ => Err(ParseSortOrderError {
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSortOrderError {
    value: String,
}

impl fmt::Display for ParseSortOrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid sort order '{}': use asc|desc", self.value)
    }
}

impl Error for ParseSortOrderError {}

/// Parameters of the visible list. The status filter is applied by the
/// store; search and sort run locally on the fetched set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub status: Option<WatchStatus>,
    pub search: Option<String>,
    pub sort: SortOrder,
}

pub fn arrange(records: Vec<SeriesRecord>, params: &ListParams) -> Vec<SeriesRecord> {
    let mut records = apply_search(records, params.search.as_deref());
    sort_by_title(&mut records, params.sort);
    records
}

pub fn apply_search(records: Vec<SeriesRecord>, term: Option<&str>) -> Vec<SeriesRecord> {
    let Some(term) = term.filter(|term| !term.is_empty()) else {
        return records;
    };
    let needle = term.to_lowercase();
    records
        .into_iter()
        .filter(|record| record.fields.title.to_lowercase().contains(&needle))
        .collect()
}

pub fn sort_by_title(records: &mut [SeriesRecord], order: SortOrder) {
    match order {
        SortOrder::Asc => records.sort_by(|a, b| compare_titles(&a.fields.title, &b.fields.title)),
        SortOrder::Desc => {
            records.sort_by(|a, b| compare_titles(&b.fields.title, &a.fields.title))
        }
    }
}

fn compare_titles(left: &str, right: &str) -> Ordering {
    left.to_lowercase()
        .cmp(&right.to_lowercase())
        .then_with(|| left.cmp(right))
}
