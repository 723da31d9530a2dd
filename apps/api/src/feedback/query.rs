//! Dashboard query: filter + sort over an in-memory slice. Never touches storage.

use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::models::feedback::{FeedbackCategory, FeedbackRecord, FeedbackStatus};

/// One filter dimension. `All` is the wildcard and imposes no constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet<T> {
    All,
    Only(T),
}

impl<T> Default for Facet<T> {
    fn default() -> Self {
        Facet::All
    }
}

impl<T: PartialEq> Facet<T> {
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Facet::All => true,
            Facet::Only(wanted) => wanted == value,
        }
    }
}

impl<T: FromStr> FromStr for Facet<T> {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(Facet::All);
        }
        s.parse()
            .map(Facet::Only)
            .map_err(|_| format!("unknown filter value '{s}'"))
    }
}

impl<'de, T: FromStr> Deserialize<'de> for Facet<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    Newest,
    Oldest,
    MostUpvotes,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackFilters {
    #[serde(default)]
    pub status: Facet<FeedbackStatus>,
    #[serde(default)]
    pub category: Facet<FeedbackCategory>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: Option<SortOrder>,
}

/// Applies status, category and search filters, then the optional sort.
///
/// Search is a case-insensitive substring match against title or description.
/// Sorting is stable: ties keep their input order.
pub fn query(records: &[FeedbackRecord], filters: &FeedbackFilters) -> Vec<FeedbackRecord> {
    let needle = filters
        .search
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut matched: Vec<FeedbackRecord> = records
        .iter()
        .filter(|r| filters.status.admits(&r.status))
        .filter(|r| filters.category.admits(&r.category))
        .filter(|r| match &needle {
            Some(n) => r.title.to_lowercase().contains(n) || r.description.to_lowercase().contains(n),
            None => true,
        })
        .cloned()
        .collect();

    match filters.sort_by {
        Some(SortOrder::Newest) => matched.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        Some(SortOrder::Oldest) => matched.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        Some(SortOrder::MostUpvotes) => matched.sort_by(|a, b| b.upvotes.cmp(&a.upvotes)),
        None => {}
    }

    matched
}
