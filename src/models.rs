//! Document schemas for the marketplace collections.
//!
//! These mirror the documents written by the other marketplace services.
//! Field names are camelCase on the wire and the identifier is `_id`.

use mongodb::bson::{oid::ObjectId, DateTime, Document};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

pub const USERS: &str = "users";
pub const PROJECTS: &str = "projects";
pub const BIDS: &str = "bids";
pub const REVIEWS: &str = "reviews";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Freelancer,
    Client,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Freelancer => "freelancer",
            Role::Client => "client",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VerificationLevel {
    #[default]
    Basic,
    Verified,
    Premium,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneStatus {
    #[default]
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Open => "open",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BidStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

/// A showcase entry on a freelancer profile.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItem {
    #[validate(length(min = 1))]
    pub title: String,
    pub description: Option<String>,
    /// Older documents store this under `link`
    #[serde(alias = "link")]
    #[validate(url)]
    pub url: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    pub name: Option<String>,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    /// Password hash
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub verification_level: VerificationLevel,

    // Freelancer profile
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    #[validate(nested)]
    pub portfolio: Vec<PortfolioItem>,
    /// Profile completeness as a percentage
    #[serde(default)]
    #[validate(range(min = 0, max = 100))]
    pub profile_completed: i32,

    // Client profile
    #[serde(default)]
    #[schema(value_type = Object)]
    pub preferences: Document,

    #[schema(value_type = Option<String>, format = DateTime)]
    pub created_at: Option<DateTime>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub updated_at: Option<DateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    #[validate(length(min = 1))]
    pub title: String,
    #[schema(value_type = String, format = DateTime)]
    pub due_date: DateTime,
    #[serde(default)]
    pub status: MilestoneStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeLog {
    #[schema(value_type = String, format = DateTime)]
    pub date: DateTime,
    #[validate(range(min = 0))]
    pub hours: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    #[validate(length(min = 1))]
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    #[validate(range(min = 0.0))]
    pub budget: f64,
    #[schema(value_type = String, format = DateTime)]
    pub deadline: DateTime,
    #[serde(default)]
    pub is_hourly: bool,
    #[serde(default)]
    #[validate(nested)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    #[validate(nested)]
    pub time_logs: Vec<TimeLog>,
    #[schema(value_type = String)]
    pub client_id: ObjectId,
    #[schema(value_type = Option<String>)]
    pub freelancer_id: Option<ObjectId>,
    #[serde(default)]
    pub status: ProjectStatus,
    /// Completion percentage
    #[serde(default)]
    #[validate(range(min = 0, max = 100))]
    pub progress: i32,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub created_at: Option<DateTime>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub updated_at: Option<DateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    #[schema(value_type = String)]
    pub project_id: ObjectId,
    #[schema(value_type = String)]
    pub freelancer_id: ObjectId,
    pub proposal: Option<String>,
    #[validate(range(min = 0.0))]
    pub bid_amount: f64,
    #[serde(default)]
    pub status: BidStatus,
    pub counter_offer: Option<f64>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub created_at: Option<DateTime>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub updated_at: Option<DateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    #[schema(value_type = String)]
    pub project_id: ObjectId,
    #[schema(value_type = String)]
    pub client_id: ObjectId,
    #[schema(value_type = String)]
    pub freelancer_id: ObjectId,
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    pub comment: Option<String>,
    pub freelancer_response: Option<String>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub created_at: Option<DateTime>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub updated_at: Option<DateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{self, doc};

    fn freelancer() -> User {
        User {
            id: None,
            name: Some("Ada".to_string()),
            email: "ada@example.com".to_string(),
            phone: None,
            password: "hashed".to_string(),
            role: Role::Freelancer,
            is_verified: false,
            verification_level: VerificationLevel::default(),
            skills: vec!["rust".to_string()],
            portfolio: vec![],
            profile_completed: 40,
            preferences: Document::new(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_user_defaults_from_minimal_document() {
        let user: User = bson::from_document(doc! {
            "email": "client@example.com",
            "password": "$2b$10$hash",
            "role": "client",
        })
        .unwrap();

        assert_eq!(user.password, "$2b$10$hash");
        assert_eq!(user.role, Role::Client);
        assert!(!user.is_verified);
        assert_eq!(user.verification_level, VerificationLevel::Basic);
        assert!(user.skills.is_empty());
        assert_eq!(user.profile_completed, 0);
        assert!(user.preferences.is_empty());
    }

    #[test]
    fn test_user_requires_password() {
        let result = bson::from_document::<User>(doc! {
            "email": "client@example.com",
            "role": "client",
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_user_rejects_bad_email_and_completion() {
        let mut user = freelancer();
        assert!(user.validate().is_ok());

        user.email = "not-an-email".to_string();
        user.profile_completed = 120;
        let errors = user.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_portfolio_accepts_legacy_link_key() {
        let item: PortfolioItem = bson::from_document(doc! {
            "title": "Landing page",
            "link": "https://example.com/work",
        })
        .unwrap();
        assert_eq!(item.url.as_deref(), Some("https://example.com/work"));
        assert!(item.validate().is_ok());
    }

    #[test]
    fn test_nested_portfolio_is_validated() {
        let mut user = freelancer();
        user.portfolio.push(PortfolioItem {
            title: String::new(),
            description: None,
            url: Some("nope".to_string()),
            image: None,
        });
        assert!(user.validate().is_err());
    }

    #[test]
    fn test_project_status_wire_format() {
        let project: Project = bson::from_document(doc! {
            "title": "Website",
            "budget": 500.0,
            "deadline": DateTime::now(),
            "clientId": ObjectId::new(),
            "status": "in_progress",
            "timeLogs": [{ "date": DateTime::now(), "hours": 3 }],
        })
        .unwrap();

        assert_eq!(project.status, ProjectStatus::InProgress);
        assert_eq!(project.status.as_str(), "in_progress");
        assert_eq!(project.progress, 0);
        assert!(!project.is_hourly);
        assert_eq!(project.time_logs.len(), 1);
        assert!(project.freelancer_id.is_none());
    }

    #[test]
    fn test_project_rejects_negative_budget_and_bad_milestone() {
        let project = Project {
            id: None,
            title: "Logo".to_string(),
            description: None,
            category: Some("design".to_string()),
            budget: -1.0,
            deadline: DateTime::now(),
            is_hourly: false,
            milestones: vec![Milestone {
                title: String::new(),
                due_date: DateTime::now(),
                status: MilestoneStatus::Pending,
            }],
            time_logs: vec![TimeLog {
                date: DateTime::now(),
                hours: -2,
            }],
            client_id: ObjectId::new(),
            freelancer_id: None,
            status: ProjectStatus::Open,
            progress: 0,
            created_at: None,
            updated_at: None,
        };

        let errors = project.validate().unwrap_err();
        let fields = errors.errors();
        assert!(fields.contains_key("budget"));
        assert!(fields.contains_key("milestones"));
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn test_review_rating_bounds() {
        let mut review = Review {
            id: None,
            project_id: ObjectId::new(),
            client_id: ObjectId::new(),
            freelancer_id: ObjectId::new(),
            rating: 5,
            comment: Some("Great work".to_string()),
            freelancer_response: None,
            created_at: None,
            updated_at: None,
        };
        assert!(review.validate().is_ok());

        review.rating = 0;
        assert!(review.validate().is_err());
        review.rating = 6;
        assert!(review.validate().is_err());
    }

    #[test]
    fn test_bid_defaults_to_pending() {
        let bid: Bid = bson::from_document(doc! {
            "projectId": ObjectId::new(),
            "freelancerId": ObjectId::new(),
            "bidAmount": 250.0,
        })
        .unwrap();
        assert_eq!(bid.status, BidStatus::Pending);
        assert!(bid.counter_offer.is_none());
    }
}
