use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use freelance_analytics::config::ServerConfig;
use freelance_analytics::models::{Bid, Milestone, PortfolioItem, Project, Review, TimeLog, User};
use freelance_analytics::observability::{init_tracing, HealthChecks, HealthStatus, MetricsResponse};
use freelance_analytics::routes::{apply_middleware, create_router, API_PREFIX};
use freelance_analytics::state::AppState;
use freelance_analytics::store::MongoStore;
use freelance_analytics::types::{
    DailyProjects, DailySignups, ErrorBody, PlatformStats, RevenueStats, SkillCount,
};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        freelance_analytics::handlers::platform_stats_handler,
        freelance_analytics::handlers::skill_popularity_handler,
        freelance_analytics::handlers::revenue_stats_handler,
        freelance_analytics::handlers::signup_trends_handler,
        freelance_analytics::handlers::project_trends_handler,
        freelance_analytics::observability::health_handler,
        freelance_analytics::observability::metrics_handler,
    ),
    components(schemas(
        PlatformStats,
        SkillCount,
        RevenueStats,
        DailySignups,
        DailyProjects,
        ErrorBody,
        HealthStatus,
        HealthChecks,
        MetricsResponse,
        User,
        PortfolioItem,
        Project,
        Milestone,
        TimeLog,
        Bid,
        Review
    )),
    tags(
        (name = "Analytics", description = "Aggregate marketplace statistics"),
        (name = "System", description = "Health and metrics")
    ),
    info(
        title = "Freelance Marketplace Analytics API",
        description = "Counts, revenue and daily trends over users, projects, bids and reviews. \
                       Every analytics endpoint accepts `?export=csv` or `?export=pdf`.",
        version = "1.0.0"
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::parse();

    let store = MongoStore::connect(&config.mongo_uri, config.database.as_deref())
        .await
        .context("Failed to create MongoDB client")?;

    let state = AppState::new(Arc::new(store)).with_trend_window(config.trend_window_days);

    let app = create_router(state).merge(
        SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
    let app = apply_middleware(
        app,
        &config.cors_origins,
        Duration::from_secs(config.request_timeout_secs),
    );

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {}", address))?;

    info!("Analytics Service running on http://{}", address);
    info!("Analytics API: http://{}{}", address, API_PREFIX);
    info!("Swagger UI: http://{}/swagger-ui/", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
