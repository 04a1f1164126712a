use std::sync::Arc;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, MatchedPath},
    http::{header, HeaderName, HeaderValue, Method, Request, StatusCode},
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::auth::{
    require_admin, require_ingest_token, AdminPolicy, IngestToken, INGEST_TOKEN_HEADER,
    TELEGRAM_USER_ID_HEADER,
};
use crate::config::{ApiServerConfig, AppConfig};
use crate::services::SecretService;

use super::{
    handlers::{
        create_secret_handler, delete_secret_handler, get_secret_handler, health_handler,
        list_secrets_handler, secret_views_handler,
    },
    rate_limit::{limit_by_peer, ClientAddress, FetchRateLimit, RateLimiter},
};

#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<SecretService>,
}

pub fn build_router(service: Arc<SecretService>, config: &AppConfig) -> Router {
    let api_state = ApiState { service };

    let admin_layer = middleware::from_fn_with_state(
        AdminPolicy::new(config.admin.telegram_id),
        require_admin,
    );

    let admin_api = Router::new()
        .route("/api/admin/secrets", get(list_secrets_handler))
        .route("/api/admin/secrets/{key}", delete(delete_secret_handler))
        .route("/api/admin/secrets/{key}/views", get(secret_views_handler))
        .route_layer(admin_layer);

    let mut public_api = Router::new().route("/api/secret/{key}", get(get_secret_handler));
    match RateLimiter::per_minute(config.api.fetch_rate_limit_per_minute) {
        Some(limiter) => {
            let state = FetchRateLimit { limiter, client: ClientAddress::from_config(&config.api) };
            public_api =
                public_api.route_layer(middleware::from_fn_with_state(state, limit_by_peer));
        }
        None => warn!("Secret fetch rate limiting is disabled"),
    }

    let mut router =
        Router::new().route("/health", get(health_handler)).merge(public_api).merge(admin_api);

    match config.admin.ingest_token.as_deref() {
        Some(token) => {
            let ingest_layer =
                middleware::from_fn_with_state(IngestToken::new(token), require_ingest_token);
            router = router.merge(
                Router::new()
                    .route("/api/secrets", post(create_secret_handler))
                    .route_layer(ingest_layer),
            );
        }
        None => info!("No ingest token configured; POST /api/secrets is not mounted"),
    }

    router
        .with_state(api_state)
        .layer(DefaultBodyLimit::max(config.api.max_body_size))
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, config.api.timeout()))
        .layer(build_cors_layer(&config.api))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
}

/// Request span. Uses the route template, never the raw path, so secret
/// keys stay out of the logs.
fn make_request_span(request: &Request<Body>) -> tracing::Span {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    info_span!(
        "http_request",
        method = %request.method(),
        route = %route,
        request_id = %Uuid::new_v4()
    )
}

/// Build the CORS layer; an empty origin list allows any origin.
fn build_cors_layer(config: &ApiServerConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            HeaderName::from_static(TELEGRAM_USER_ID_HEADER),
            HeaderName::from_static(INGEST_TOKEN_HEADER),
            header::CONTENT_TYPE,
        ]);

    if config.cors_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    cors.allow_origin(origins)
}
