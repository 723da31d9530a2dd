use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Domain a piece of feedback belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedbackCategory {
    Infrastructure,
    PublicServices,
    Environment,
    Community,
    Safety,
    Other,
}

impl FeedbackCategory {
    pub const ALL: [FeedbackCategory; 6] = [
        FeedbackCategory::Infrastructure,
        FeedbackCategory::PublicServices,
        FeedbackCategory::Environment,
        FeedbackCategory::Community,
        FeedbackCategory::Safety,
        FeedbackCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackCategory::Infrastructure => "infrastructure",
            FeedbackCategory::PublicServices => "public-services",
            FeedbackCategory::Environment => "environment",
            FeedbackCategory::Community => "community",
            FeedbackCategory::Safety => "safety",
            FeedbackCategory::Other => "other",
        }
    }
}

impl FromStr for FeedbackCategory {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeedbackCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// Handling state of a feedback record. Any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedbackStatus {
    Pending,
    InReview,
    InProgress,
    Resolved,
    Rejected,
}

impl FeedbackStatus {
    pub const ALL: [FeedbackStatus; 5] = [
        FeedbackStatus::Pending,
        FeedbackStatus::InReview,
        FeedbackStatus::InProgress,
        FeedbackStatus::Resolved,
        FeedbackStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackStatus::Pending => "pending",
            FeedbackStatus::InReview => "in-review",
            FeedbackStatus::InProgress => "in-progress",
            FeedbackStatus::Resolved => "resolved",
            FeedbackStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for FeedbackStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeedbackStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

/// The single staff reply a record may carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficialResponse {
    pub id: String,
    pub content: String,
    pub responded_by: String,
    pub responded_at: DateTime<Utc>,
}

/// Persisted form of one feedback item. Field names follow the stored JSON layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: FeedbackCategory,
    pub status: FeedbackStatus,
    pub upvotes: u32,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub official_response: Option<OfficialResponse>,
}

impl FeedbackRecord {
    /// Shallow merge: every field present in `patch` replaces the stored one.
    /// `id` and `createdAt` are not part of a patch and never change.
    pub fn apply(&mut self, patch: FeedbackPatch) {
        let FeedbackPatch {
            title,
            description,
            category,
            status,
            upvotes,
            created_by,
            location,
            attachments,
            official_response,
        } = patch;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(category) = category {
            self.category = category;
        }
        if let Some(status) = status {
            self.status = status;
        }
        if let Some(upvotes) = upvotes {
            self.upvotes = upvotes;
        }
        if let Some(created_by) = created_by {
            self.created_by = created_by;
        }
        if let Some(location) = location {
            self.location = Some(location);
        }
        if let Some(attachments) = attachments {
            self.attachments = Some(attachments);
        }
        if let Some(response) = official_response {
            self.official_response = Some(response);
        }
    }
}

/// Input for creating a record. Status, upvotes, id and timestamp are assigned by the store.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
    pub title: String,
    pub category: FeedbackCategory,
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub attachments: Option<Vec<String>>,
    /// Already-resolved display name. `None` defers to the session identity.
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FeedbackPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<FeedbackCategory>,
    pub status: Option<FeedbackStatus>,
    pub upvotes: Option<u32>,
    pub created_by: Option<String>,
    pub location: Option<String>,
    pub attachments: Option<Vec<String>>,
    pub official_response: Option<OfficialResponse>,
}
