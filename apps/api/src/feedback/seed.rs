//! Bootstrap dataset written by `FeedbackStore::initialize` on an empty store.

use chrono::{DateTime, Duration, Utc};

use crate::models::feedback::{FeedbackCategory, FeedbackRecord, FeedbackStatus, OfficialResponse};
use crate::models::user::{Role, User};

/// Seed records, timestamps relative to `now`. Stored order is the order returned.
pub fn seed_feedback(now: DateTime<Utc>) -> Vec<FeedbackRecord> {
    let days_ago = |d: i64| now - Duration::days(d);

    vec![
        FeedbackRecord {
            id: "1".to_string(),
            title: "Broken Street Lights on Main Street".to_string(),
            description: "Several street lights are not working on Main Street between Oak Avenue and Pine Road. This has created a safety concern for pedestrians at night.".to_string(),
            category: FeedbackCategory::Infrastructure,
            status: FeedbackStatus::InProgress,
            upvotes: 24,
            created_at: days_ago(14),
            created_by: "Jane Smith".to_string(),
            location: Some("Main Street".to_string()),
            attachments: None,
            official_response: Some(OfficialResponse {
                id: "1-response".to_string(),
                content: "Thank you for reporting this issue. Our maintenance team has been notified and will repair the lights within the next 48 hours.".to_string(),
                responded_by: "Tom Johnson".to_string(),
                responded_at: days_ago(10),
            }),
        },
        FeedbackRecord {
            id: "2".to_string(),
            title: "Request for Additional Trash Bins in Village Park".to_string(),
            description: "The village park is experiencing litter problems, especially on weekends. Additional trash bins would help maintain cleanliness.".to_string(),
            category: FeedbackCategory::Environment,
            status: FeedbackStatus::Pending,
            upvotes: 18,
            created_at: days_ago(7),
            created_by: "Michael Brown".to_string(),
            location: Some("Village Park".to_string()),
            attachments: None,
            official_response: None,
        },
        FeedbackRecord {
            id: "3".to_string(),
            title: "Community Garden Proposal".to_string(),
            description: "I would like to propose establishing a community garden on the vacant lot at the corner of Elm Street and River Road. This would provide fresh produce and foster community engagement.".to_string(),
            category: FeedbackCategory::Community,
            status: FeedbackStatus::InReview,
            upvotes: 32,
            created_at: days_ago(30),
            created_by: "Sarah Johnson".to_string(),
            location: Some("Elm Street and River Road".to_string()),
            attachments: None,
            official_response: None,
        },
        FeedbackRecord {
            id: "4".to_string(),
            title: "Speeding Issues on Residential Streets".to_string(),
            description: "Cars are consistently speeding on Cedar Avenue, creating danger for children and pets. I request additional speed bumps or enforcement.".to_string(),
            category: FeedbackCategory::Safety,
            status: FeedbackStatus::Resolved,
            upvotes: 45,
            created_at: days_ago(60),
            created_by: "David Williams".to_string(),
            location: Some("Cedar Avenue".to_string()),
            attachments: None,
            official_response: Some(OfficialResponse {
                id: "4-response".to_string(),
                content: "We have installed new speed bumps and added additional patrol during peak hours. Please let us know if the situation improves.".to_string(),
                responded_by: "Chief Roberts".to_string(),
                responded_at: days_ago(30),
            }),
        },
    ]
}

/// Seed roster. The first entry is the default current user.
pub fn seed_users() -> Vec<User> {
    vec![
        User {
            id: "1".to_string(),
            name: "Jane Smith".to_string(),
            email: "jane.smith@example.com".to_string(),
            role: Role::Citizen,
            avatar_url: None,
        },
        User {
            id: "2".to_string(),
            name: "Tom Johnson".to_string(),
            email: "tom.johnson@example.com".to_string(),
            role: Role::Official,
            avatar_url: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_seed_shape() {
        let records = seed_feedback(Utc::now());
        assert_eq!(records.len(), 4);

        let statuses: Vec<_> = records.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                FeedbackStatus::InProgress,
                FeedbackStatus::Pending,
                FeedbackStatus::InReview,
                FeedbackStatus::Resolved
            ]
        );

        let categories: HashSet<_> = records.iter().map(|r| r.category).collect();
        assert!(!categories.contains(&FeedbackCategory::PublicServices));
        assert!(!categories.contains(&FeedbackCategory::Other));

        let with_response = records.iter().filter(|r| r.official_response.is_some()).count();
        assert_eq!(with_response, 2);
    }

    #[test]
    fn test_seed_timestamps_are_relative_to_now() {
        let now: DateTime<Utc> = "2025-01-31T00:00:00Z".parse().unwrap();
        let records = seed_feedback(now);
        assert_eq!(records[0].created_at, now - Duration::days(14));
        assert_eq!(records[3].created_at, now - Duration::days(60));
    }

    #[test]
    fn test_seed_roster_roles() {
        let users = seed_users();
        assert_eq!(users[0].role, Role::Citizen);
        assert!(users[1].is_official());
    }
}
