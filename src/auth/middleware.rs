//! Axum middleware wrapping [`AdminPolicy`] and [`IngestToken`].

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{Method, Request},
    middleware::Next,
    response::Response,
};
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use super::{AdminPolicy, IngestToken, INGEST_TOKEN_HEADER, TELEGRAM_USER_ID_HEADER};
use crate::api::error::ApiError;
use crate::errors::SecretDropError;
use crate::observability::metrics;

/// Verified admin identity, inserted into request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminContext {
    pub telegram_id: i64,
}

fn header_value<'a>(request: &'a Request<Body>, name: &str) -> Option<&'a str> {
    request.headers().get(name).and_then(|value| value.to_str().ok())
}

/// Route template of the request; raw paths can contain secret keys
fn route_of(request: &Request<Body>) -> &str {
    request.extensions().get::<MatchedPath>().map_or("unmatched", MatchedPath::as_str)
}

fn deny(err: SecretDropError, correlation_id: Uuid, request: &Request<Body>) -> ApiError {
    if let SecretDropError::Auth { error_type, .. } = &err {
        metrics::record_auth_denied(*error_type);
    }
    warn!(
        correlation_id = %correlation_id,
        method = %request.method(),
        route = %route_of(request),
        error = %err,
        "Request denied"
    );
    ApiError::from(err)
}

pub async fn require_admin(
    State(policy): State<AdminPolicy>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    // Preflight requests carry no identity
    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let correlation_id = Uuid::new_v4();
    let telegram_id = match policy.authorize(header_value(&request, TELEGRAM_USER_ID_HEADER)) {
        Ok(telegram_id) => telegram_id,
        Err(err) => return Err(deny(err, correlation_id, &request)),
    };

    request.extensions_mut().insert(AdminContext { telegram_id });
    let span = info_span!(
        "admin_request",
        correlation_id = %correlation_id,
        admin_id = telegram_id,
        route = %route_of(&request)
    );

    Ok(next.run(request).instrument(span).await)
}

pub async fn require_ingest_token(
    State(token): State<IngestToken>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let correlation_id = Uuid::new_v4();
    if let Err(err) = token.verify(header_value(&request, INGEST_TOKEN_HEADER)) {
        return Err(deny(err, correlation_id, &request));
    }

    let span = info_span!("ingest_request", correlation_id = %correlation_id);
    Ok(next.run(request).instrument(span).await)
}
