use crate::handlers::{
    platform_stats_handler, project_trends_handler, revenue_stats_handler, root_handler,
    signup_trends_handler, skill_popularity_handler,
};
use crate::observability::{health_handler, metrics_handler};
use crate::state::AppState;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Mount point of the analytics route group.
pub const API_PREFIX: &str = "/api/analytics";

/// Analytics endpoints carry no request bodies.
const MAX_BODY_BYTES: usize = 16 * 1024;

pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/platform", get(platform_stats_handler))
        .route("/skills", get(skill_popularity_handler))
        .route("/revenue", get(revenue_stats_handler))
        .route("/signup-trends", get(signup_trends_handler))
        .route("/project-trends", get(project_trends_handler))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .nest(API_PREFIX, analytics_routes())
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// `*` allows any origin, otherwise `origins` is a comma-separated allow list.
pub fn build_cors_layer(origins: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    if origins.trim() == "*" {
        cors.allow_origin(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(allowed)
    }
}

/// Wraps the router with the HTTP middleware stack.
pub fn apply_middleware(router: Router, cors_origins: &str, request_timeout: Duration) -> Router {
    router
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(cors_origins))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(origins: &str) -> Router {
        let state = AppState::new(Arc::new(MemoryStore::new()));
        apply_middleware(create_router(state), origins, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_any_origin_allowed_by_default() {
        let response = app("*")
            .oneshot(
                Request::builder()
                    .uri("/api/analytics/platform")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_preflight_echoes_listed_origin_only() {
        let app = app("http://localhost:3000, https://market.example.com");

        let preflight = |origin: &'static str| {
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/analytics/skills")
                .header(header::ORIGIN, origin)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap()
        };

        let allowed = app
            .clone()
            .oneshot(preflight("https://market.example.com"))
            .await
            .unwrap();
        assert_eq!(
            allowed.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://market.example.com"
        );

        let denied = app.oneshot(preflight("https://evil.example.com")).await.unwrap();
        assert!(denied
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = app("*")
            .oneshot(
                Request::builder()
                    .uri("/api/analytics/unknown")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
