use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    /// All registered accounts
    pub total_users: u64,
    pub total_freelancers: u64,
    pub total_clients: u64,
    pub total_projects: u64,
    pub total_bids: u64,
    pub total_reviews: u64,
    /// Projects with status `completed`
    pub completed_projects: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SkillCount {
    /// Skill name
    #[serde(rename = "_id")]
    pub skill: String,
    /// Number of freelancers listing the skill
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenueStats {
    /// Sum of budgets over completed projects
    pub total_revenue: f64,
    /// Mean budget over completed projects
    pub avg_project_budget: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DailySignups {
    /// UTC day formatted as `YYYY-MM-DD`
    #[serde(rename = "_id")]
    pub date: String,
    pub signups: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DailyProjects {
    /// UTC day formatted as `YYYY-MM-DD`
    #[serde(rename = "_id")]
    pub date: String,
    pub projects: u64,
}

/// Query parameters accepted by every analytics endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    /// Return the result as a file: `csv` or `pdf`
    #[param(example = "csv")]
    pub export: Option<String>,
}

/// Query parameters for the daily trend endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TrendQuery {
    /// Return the result as a file: `csv` or `pdf`
    #[param(example = "pdf")]
    pub export: Option<String>,
    /// Size of the look-back window in days (1 to 365)
    #[param(example = 30)]
    pub days: Option<i64>,
}

/// Error body returned by failing endpoints
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub status: u16,
}
