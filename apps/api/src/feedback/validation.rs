use serde::{Deserialize, Serialize};

use crate::feedback::store::ANONYMOUS;
use crate::models::feedback::{FeedbackCategory, NewFeedback};
use crate::models::user::Session;

pub const TITLE_MIN: usize = 5;
pub const TITLE_MAX: usize = 100;
pub const DESCRIPTION_MIN: usize = 20;
pub const DESCRIPTION_MAX: usize = 500;
pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 50;

/// Body of a submission from the public form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFeedbackRequest {
    pub title: String,
    pub category: FeedbackCategory,
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub submitter_name: Option<String>,
    #[serde(default)]
    pub anonymous: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldProblem {
    pub field: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub passed: bool,
    pub problems: Vec<FieldProblem>,
}

impl ValidationReport {
    pub fn summary(&self) -> String {
        self.problems
            .iter()
            .map(|p| format!("{}: {}", p.field, p.reason))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn check_length(field: &str, value: &str, min: usize, max: usize, out: &mut Vec<FieldProblem>) {
    let len = value.trim().chars().count();
    if len < min {
        out.push(FieldProblem {
            field: field.to_string(),
            reason: format!("must be at least {min} characters"),
        });
    } else if len > max {
        out.push(FieldProblem {
            field: field.to_string(),
            reason: format!("must be at most {max} characters"),
        });
    }
}

pub fn validate_submission(req: &SubmitFeedbackRequest) -> ValidationReport {
    let mut problems = Vec::new();
    check_length("title", &req.title, TITLE_MIN, TITLE_MAX, &mut problems);
    check_length(
        "description",
        &req.description,
        DESCRIPTION_MIN,
        DESCRIPTION_MAX,
        &mut problems,
    );

    // A blank name is treated as no name; only anonymous submissions skip the check.
    if !req.anonymous {
        if let Some(name) = req.submitter_name.as_deref().filter(|n| !n.trim().is_empty()) {
            check_length("submitterName", name, NAME_MIN, NAME_MAX, &mut problems);
        }
    }

    ValidationReport {
        passed: problems.is_empty(),
        problems,
    }
}

pub fn validate_response(content: &str) -> ValidationReport {
    let mut problems = Vec::new();
    if content.trim().is_empty() {
        problems.push(FieldProblem {
            field: "content".to_string(),
            reason: "response cannot be empty".to_string(),
        });
    }
    ValidationReport {
        passed: problems.is_empty(),
        problems,
    }
}

impl SubmitFeedbackRequest {
    /// Resolves the author: anonymous wins, then a typed name, then the
    /// session user, then `Anonymous`.
    pub fn into_new_feedback(self, session: &Session) -> NewFeedback {
        let created_by = if self.anonymous {
            ANONYMOUS.to_string()
        } else {
            self.submitter_name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .or(session.display_name())
                .unwrap_or(ANONYMOUS)
                .to_string()
        };

        NewFeedback {
            title: self.title.trim().to_string(),
            category: self.category,
            description: self.description.trim().to_string(),
            location: self
                .location
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
            attachments: None,
            created_by: Some(created_by),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{Role, User};

    fn request() -> SubmitFeedbackRequest {
        SubmitFeedbackRequest {
            title: "Flooded underpass".to_string(),
            category: FeedbackCategory::Infrastructure,
            description: "Water pools under the rail bridge after every storm.".to_string(),
            location: Some("  ".to_string()),
            submitter_name: None,
            anonymous: false,
        }
    }

    fn session() -> Session {
        Session::for_user(User {
            id: "1".to_string(),
            name: "Jane Smith".to_string(),
            email: "jane.smith@example.com".to_string(),
            role: Role::Citizen,
            avatar_url: None,
        })
    }

    #[test]
    fn test_valid_submission_passes() {
        assert!(validate_submission(&request()).passed);
    }

    #[test]
    fn test_short_title_and_description_fail() {
        let mut req = request();
        req.title = "Hi".to_string();
        req.description = "Too short".to_string();
        let report = validate_submission(&req);
        assert!(!report.passed);
        assert_eq!(report.problems.len(), 2);
        assert!(report.summary().contains("title: must be at least 5"));
    }

    #[test]
    fn test_whitespace_does_not_count_toward_length() {
        let mut req = request();
        req.title = "   ab   ".to_string();
        assert!(!validate_submission(&req).passed);
    }

    #[test]
    fn test_overlong_title_fails() {
        let mut req = request();
        req.title = "x".repeat(TITLE_MAX + 1);
        assert!(!validate_submission(&req).passed);
    }

    #[test]
    fn test_description_capped_at_500() {
        let mut req = request();
        req.description = "d".repeat(DESCRIPTION_MAX);
        assert!(validate_submission(&req).passed);
        req.description = "d".repeat(DESCRIPTION_MAX + 1);
        let report = validate_submission(&req);
        assert!(!report.passed);
        assert_eq!(report.problems[0].field, "description");
    }

    #[test]
    fn test_submitter_name_length_bounds() {
        let mut req = request();
        req.submitter_name = Some("J".to_string());
        let report = validate_submission(&req);
        assert!(!report.passed);
        assert_eq!(report.problems[0].field, "submitterName");

        req.submitter_name = Some("n".repeat(NAME_MAX + 1));
        assert!(!validate_submission(&req).passed);

        req.submitter_name = Some("Jo".to_string());
        assert!(validate_submission(&req).passed);
    }

    #[test]
    fn test_name_ignored_when_anonymous_or_blank() {
        let mut req = request();
        req.submitter_name = Some("J".to_string());
        req.anonymous = true;
        assert!(validate_submission(&req).passed);

        req.anonymous = false;
        req.submitter_name = Some("   ".to_string());
        assert!(validate_submission(&req).passed);
    }

    #[test]
    fn test_blank_response_fails() {
        assert!(!validate_response("   ").passed);
        assert!(validate_response("On it.").passed);
    }

    #[test]
    fn test_anonymous_overrides_name_and_session() {
        let mut req = request();
        req.anonymous = true;
        req.submitter_name = Some("Jane".to_string());
        assert_eq!(req.into_new_feedback(&session()).created_by.as_deref(), Some(ANONYMOUS));
    }

    #[test]
    fn test_typed_name_beats_session() {
        let mut req = request();
        req.submitter_name = Some("  Sam Lee ".to_string());
        assert_eq!(req.into_new_feedback(&session()).created_by.as_deref(), Some("Sam Lee"));
    }

    #[test]
    fn test_falls_back_to_session_then_anonymous() {
        assert_eq!(request().into_new_feedback(&session()).created_by.as_deref(), Some("Jane Smith"));
        assert_eq!(
            request().into_new_feedback(&Session::default()).created_by.as_deref(),
            Some(ANONYMOUS)
        );
    }

    #[test]
    fn test_blank_location_dropped() {
        assert!(request().into_new_feedback(&session()).location.is_none());
    }
}
