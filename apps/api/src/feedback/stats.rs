//! Aggregates shown on the dashboard statistics tab and the landing page.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::feedback::query::{query, FeedbackFilters, SortOrder};
use crate::models::feedback::{FeedbackCategory, FeedbackRecord, FeedbackStatus};

pub const RECENT_LIMIT: usize = 3;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub in_review: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub counts: StatusCounts,
    /// Only categories that occur at least once.
    pub categories: BTreeMap<FeedbackCategory, usize>,
    pub resolved_percent: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LandingSummary {
    pub total: usize,
    pub resolved: usize,
    pub in_progress: usize,
    /// pending + in-review
    pub open: usize,
    pub recent: Vec<FeedbackRecord>,
}

pub fn count_by_status(records: &[FeedbackRecord]) -> StatusCounts {
    let mut counts = StatusCounts {
        total: records.len(),
        ..Default::default()
    };
    for record in records {
        match record.status {
            FeedbackStatus::Pending => counts.pending += 1,
            FeedbackStatus::InReview => counts.in_review += 1,
            FeedbackStatus::InProgress => counts.in_progress += 1,
            FeedbackStatus::Resolved => counts.resolved += 1,
            FeedbackStatus::Rejected => counts.rejected += 1,
        }
    }
    counts
}

pub fn dashboard_stats(records: &[FeedbackRecord]) -> DashboardStats {
    let counts = count_by_status(records);

    let mut categories = BTreeMap::new();
    for record in records {
        *categories.entry(record.category).or_insert(0) += 1;
    }

    let resolved_percent = if counts.total == 0 {
        0
    } else {
        (counts.resolved as f64 / counts.total as f64 * 100.0).round() as u32
    };

    DashboardStats {
        counts,
        categories,
        resolved_percent,
    }
}

pub fn landing_summary(records: &[FeedbackRecord]) -> LandingSummary {
    let counts = count_by_status(records);
    let mut recent = query(
        records,
        &FeedbackFilters {
            sort_by: Some(SortOrder::Newest),
            ..Default::default()
        },
    );
    recent.truncate(RECENT_LIMIT);

    LandingSummary {
        total: counts.total,
        resolved: counts.resolved,
        in_progress: counts.in_progress,
        open: counts.pending + counts.in_review,
        recent,
    }
}
