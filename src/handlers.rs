use crate::error::{AppError, AppResult};
use crate::export::{export_records, ExportFile, ExportFormat};
use crate::observability::AppMetrics;
use crate::state::{AppState, MAX_TREND_WINDOW_DAYS};
use crate::types::{
    DailyProjects, DailySignups, ErrorBody, ExportQuery, PlatformStats, RevenueStats, SkillCount,
    TrendQuery,
};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::header,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::info;

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> AppResult<T> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))
}

/// An empty `export` value means no export.
fn export_format(name: &'static str, export: Option<&str>) -> AppResult<Option<ExportFormat>> {
    export
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            value
                .parse::<ExportFormat>()
                .map_err(|source| AppError::Export { name, source })
        })
        .transpose()
}

fn window_start(state: &AppState, days: Option<i64>) -> AppResult<DateTime<Utc>> {
    let days = days.unwrap_or(state.trend_window_days);
    if !(1..=MAX_TREND_WINDOW_DAYS).contains(&days) {
        return Err(AppError::InvalidInput(format!(
            "days must be between 1 and {}, got {}",
            MAX_TREND_WINDOW_DAYS, days
        )));
    }
    Ok(Utc::now() - Duration::days(days))
}

fn file_response(file: ExportFile) -> Response {
    (
        [
            (header::CONTENT_TYPE, file.format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, file.content_disposition()),
        ],
        file.bytes,
    )
        .into_response()
}

/// Sends `json` as the body, or `records` rendered as a file when an export
/// format was requested.
async fn respond<J, R>(
    metrics: &AppMetrics,
    name: &'static str,
    format: Option<ExportFormat>,
    json: J,
    records: Vec<R>,
) -> AppResult<Response>
where
    J: Serialize,
    R: Serialize + Send + 'static,
{
    let Some(format) = format else {
        return Ok(Json(json).into_response());
    };

    // Rendering is CPU bound, keep it off the async workers
    let file = tokio::task::spawn_blocking(move || export_records(&records, name, format))
        .await
        .map_err(|e| AppError::InternalError(format!("Export task failed: {}", e)))?
        .map_err(|source| AppError::Export { name, source })?;

    metrics.increment_exports().await;
    info!(
        "Generated export {} ({} bytes)",
        file.file_name,
        file.bytes.len()
    );
    Ok(file_response(file))
}

async fn track(metrics: &AppMetrics, result: AppResult<Response>) -> AppResult<Response> {
    match &result {
        Ok(_) => metrics.increment_success().await,
        Err(_) => metrics.increment_failure().await,
    }
    result
}

#[utoipa::path(
    get,
    path = "/api/analytics/platform",
    params(ExportQuery),
    responses(
        (status = 200, description = "Platform-wide counts", body = PlatformStats),
        (status = 400, description = "Unsupported export format", body = ErrorBody),
        (status = 500, description = "Database error", body = ErrorBody)
    ),
    tag = "Analytics"
)]
pub async fn platform_stats_handler(
    State(state): State<AppState>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> AppResult<Response> {
    state.metrics.increment_requests().await;
    let result = async {
        let params = query_params(query)?;
        let format = export_format("platform_stats", params.export.as_deref())?;
        let stats = state
            .store
            .platform_stats()
            .await
            .map_err(AppError::query("Error fetching platform stats"))?;
        info!(
            "Platform stats: {} users, {} projects",
            stats.total_users, stats.total_projects
        );
        respond(
            &state.metrics,
            "platform_stats",
            format,
            &stats,
            vec![stats.clone()],
        )
        .await
    }
    .await;
    track(&state.metrics, result).await
}

#[utoipa::path(
    get,
    path = "/api/analytics/skills",
    params(ExportQuery),
    responses(
        (status = 200, description = "Freelancer skills, most common first", body = [SkillCount]),
        (status = 400, description = "Unsupported export format", body = ErrorBody),
        (status = 500, description = "Database error", body = ErrorBody)
    ),
    tag = "Analytics"
)]
pub async fn skill_popularity_handler(
    State(state): State<AppState>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> AppResult<Response> {
    state.metrics.increment_requests().await;
    let result = async {
        let params = query_params(query)?;
        let format = export_format("skill_popularity", params.export.as_deref())?;
        let skills = state
            .store
            .skill_popularity()
            .await
            .map_err(AppError::query("Error fetching skill popularity"))?;
        respond(
            &state.metrics,
            "skill_popularity",
            format,
            &skills,
            skills.clone(),
        )
        .await
    }
    .await;
    track(&state.metrics, result).await
}

#[utoipa::path(
    get,
    path = "/api/analytics/revenue",
    params(ExportQuery),
    responses(
        (status = 200, description = "Revenue over completed projects", body = RevenueStats),
        (status = 400, description = "Unsupported export format", body = ErrorBody),
        (status = 500, description = "Database error", body = ErrorBody)
    ),
    tag = "Analytics"
)]
pub async fn revenue_stats_handler(
    State(state): State<AppState>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> AppResult<Response> {
    state.metrics.increment_requests().await;
    let result = async {
        let params = query_params(query)?;
        let format = export_format("revenue_stats", params.export.as_deref())?;
        let revenue = state
            .store
            .revenue_stats()
            .await
            .map_err(AppError::query("Error fetching revenue stats"))?;
        respond(
            &state.metrics,
            "revenue_stats",
            format,
            &revenue,
            vec![revenue.clone()],
        )
        .await
    }
    .await;
    track(&state.metrics, result).await
}

#[utoipa::path(
    get,
    path = "/api/analytics/signup-trends",
    params(TrendQuery),
    responses(
        (status = 200, description = "Signups per day, oldest first", body = [DailySignups]),
        (status = 400, description = "Invalid window or export format", body = ErrorBody),
        (status = 500, description = "Database error", body = ErrorBody)
    ),
    tag = "Analytics"
)]
pub async fn signup_trends_handler(
    State(state): State<AppState>,
    query: Result<Query<TrendQuery>, QueryRejection>,
) -> AppResult<Response> {
    state.metrics.increment_requests().await;
    let result = async {
        let params = query_params(query)?;
        let format = export_format("signup_trends", params.export.as_deref())?;
        let since = window_start(&state, params.days)?;
        let trends = state
            .store
            .signup_trends(since)
            .await
            .map_err(AppError::query("Error fetching signup trends"))?;
        respond(
            &state.metrics,
            "signup_trends",
            format,
            &trends,
            trends.clone(),
        )
        .await
    }
    .await;
    track(&state.metrics, result).await
}

#[utoipa::path(
    get,
    path = "/api/analytics/project-trends",
    params(TrendQuery),
    responses(
        (status = 200, description = "Projects posted per day, oldest first", body = [DailyProjects]),
        (status = 400, description = "Invalid window or export format", body = ErrorBody),
        (status = 500, description = "Database error", body = ErrorBody)
    ),
    tag = "Analytics"
)]
pub async fn project_trends_handler(
    State(state): State<AppState>,
    query: Result<Query<TrendQuery>, QueryRejection>,
) -> AppResult<Response> {
    state.metrics.increment_requests().await;
    let result = async {
        let params = query_params(query)?;
        let format = export_format("project_posting_trends", params.export.as_deref())?;
        let since = window_start(&state, params.days)?;
        let trends = state
            .store
            .project_posting_trends(since)
            .await
            .map_err(AppError::query("Error fetching project trends"))?;
        respond(
            &state.metrics,
            "project_posting_trends",
            format,
            &trends,
            trends.clone(),
        )
        .await
    }
    .await;
    track(&state.metrics, result).await
}

pub async fn root_handler() -> &'static str {
    "Analytics Service is running"
}
