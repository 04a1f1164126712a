//! Rate limiting for secret fetches.
//!
//! Possession of a key is the only read capability, so the public fetch
//! endpoint is throttled per client address with a token bucket to slow down
//! key guessing.
//!
//! # Configuration
//!
//! - `SECRETDROP_FETCH_RATE_LIMIT_PER_MINUTE`: fetches per minute per peer (default: 60, 0 disables)
//! - `SECRETDROP_TRUSTED_PROXY_HEADER`: header naming the client behind a proxy (default: `X-Forwarded-For`)
//! - `SECRETDROP_TRUSTED_PROXY_DEPTH`: trusted proxies in front of the server (default: 0, socket peer only)
//!
//! IPv6 clients are keyed by their /64 prefix, since a single host usually
//! controls the whole prefix.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::error::ApiError;
use crate::config::ApiServerConfig;
use crate::observability::metrics;

/// Bucket count above which idle buckets are dropped
const PRUNE_THRESHOLD: usize = 10_000;

/// Token bucket for rate limiting.
#[derive(Debug, Clone)]
struct TokenBucket {
    /// Current number of tokens available
    tokens: f64,
    /// Maximum tokens in the bucket
    max_tokens: f64,
    /// Time of last token refill
    last_refill: Instant,
    /// Token refill rate (tokens per second)
    refill_rate_per_sec: f64,
}

impl TokenBucket {
    fn new(max_tokens: u32, refill_period: Duration) -> Self {
        let refill_rate_per_sec = max_tokens as f64 / refill_period.as_secs_f64();
        Self {
            tokens: max_tokens as f64,
            max_tokens: max_tokens as f64,
            last_refill: Instant::now(),
            refill_rate_per_sec,
        }
    }

    /// Try to consume a token from the bucket.
    ///
    /// Returns `Ok(())` if successful, `Err(retry_after_secs)` if rate limited.
    fn try_consume(&mut self) -> Result<(), u32> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate_per_sec).min(self.max_tokens);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let seconds_until_refill = (1.0 - self.tokens) / self.refill_rate_per_sec;
            Err((seconds_until_refill.ceil() as u32).max(1))
        }
    }

    /// A bucket untouched for a full period is back at capacity and can be
    /// recreated on demand.
    fn is_idle(&self, now: Instant, refill_period: Duration) -> bool {
        now.duration_since(self.last_refill) >= refill_period
    }
}

/// Rate limiter using token bucket algorithm.
///
/// Each key (the client IP) has its own token bucket with configurable
/// capacity and refill rate.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<String, TokenBucket>>>,
    max_tokens: u32,
    refill_period: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter.
    ///
    /// # Arguments
    /// - `max_tokens`: Maximum requests allowed in the refill period
    /// - `refill_period`: Time period for full token bucket refill
    pub fn new(max_tokens: u32, refill_period: Duration) -> Self {
        Self { buckets: Arc::new(Mutex::new(HashMap::new())), max_tokens, refill_period }
    }

    /// Limiter allowing `per_minute` requests per key, or `None` when zero
    pub fn per_minute(per_minute: u32) -> Option<Self> {
        (per_minute > 0).then(|| Self::new(per_minute, Duration::from_secs(60)))
    }

    /// Check if request is allowed under rate limit.
    ///
    /// # Returns
    /// - `Ok(())` if request allowed
    /// - `Err(retry_after_secs)` if rate limited
    pub async fn check_rate_limit(&self, key: &str) -> Result<(), u32> {
        let mut buckets = self.buckets.lock().await;

        if buckets.len() >= PRUNE_THRESHOLD && !buckets.contains_key(key) {
            let now = Instant::now();
            let before = buckets.len();
            buckets.retain(|_, bucket| !bucket.is_idle(now, self.refill_period));
            debug!(pruned = before - buckets.len(), "Pruned idle rate limit buckets");
        }

        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.max_tokens, self.refill_period));

        match bucket.try_consume() {
            Ok(()) => {
                debug!(
                    key = %key,
                    remaining_tokens = bucket.tokens as u32,
                    "Rate limit check passed"
                );
                Ok(())
            }
            Err(retry_after) => {
                warn!(
                    key = %key,
                    retry_after_seconds = retry_after,
                    "Rate limit exceeded"
                );
                Err(retry_after)
            }
        }
    }

    #[cfg(test)]
    async fn bucket_count(&self) -> usize {
        self.buckets.lock().await.len()
    }
}

/// How the client address is derived from a request.
///
/// With `depth == 0` only the socket peer is trusted. Otherwise the
/// configured header is read: for `X-Forwarded-For` the nth entry from the
/// end, where the last entry is the one appended by the nearest proxy.
#[derive(Debug, Clone)]
pub struct ClientAddress {
    header: String,
    depth: usize,
}

impl ClientAddress {
    pub fn new(header: impl Into<String>, depth: usize) -> Self {
        Self { header: header.into(), depth }
    }

    pub fn from_config(config: &ApiServerConfig) -> Self {
        Self::new(config.trusted_proxy_header.clone(), config.trusted_proxy_depth)
    }

    fn forwarded_ip(&self, headers: &HeaderMap) -> Option<IpAddr> {
        if self.depth == 0 {
            return None;
        }

        let value = headers.get(self.header.as_str())?.to_str().ok()?;
        let candidate = if self.header.eq_ignore_ascii_case("X-Forwarded-For") {
            let entries: Vec<&str> = value.split(',').map(str::trim).collect();
            *entries.get(entries.len().checked_sub(self.depth)?)?
        } else {
            value.trim()
        };
        candidate.parse().ok()
    }

    /// Rate limit key for a request. Requests without a usable address
    /// (in-process tests, a proxy header that does not parse) share the
    /// `unknown` bucket.
    fn key_for(&self, request: &Request<Body>) -> String {
        self.forwarded_ip(request.headers())
            .or_else(|| {
                request
                    .extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .map(bucket_key)
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// IPv4 addresses key on themselves, IPv6 addresses on their /64 prefix
fn bucket_key(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => {
                let s = v6.segments();
                format!("{}/64", Ipv6Addr::new(s[0], s[1], s[2], s[3], 0, 0, 0, 0))
            }
        },
    }
}

/// Middleware state: the shared limiter and the address policy
#[derive(Debug, Clone)]
pub struct FetchRateLimit {
    pub limiter: RateLimiter,
    pub client: ClientAddress,
}

pub async fn limit_by_peer(
    State(state): State<FetchRateLimit>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let key = state.client.key_for(&request);
    if let Err(retry_after) = state.limiter.check_rate_limit(&key).await {
        metrics::record_rate_limited();
        return Err(ApiError::rate_limited(retry_after));
    }
    Ok(next.run(request).await)
}
