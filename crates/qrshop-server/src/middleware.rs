use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

const API_KEYS_VAR: &str = "QRSHOP_API_KEYS";
const REQUEST_ID_HEADER: &str = "x-request-id";
/// Longest caller-supplied request id that is echoed back.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Correlates log lines and error envelopes for one request.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Bearer keys accepted on the admin routes.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<Vec<String>>,
    pub enabled: bool,
}

impl AuthState {
    /// Reads comma-separated keys from `QRSHOP_API_KEYS`.
    ///
    /// # Errors
    ///
    /// Fails when no key is configured and `is_development` is false.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var(API_KEYS_VAR).unwrap_or_default();
        Self::from_keys(&raw, is_development)
    }

    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_keys(raw: &str, is_development: bool) -> anyhow::Result<Self> {
        let mut keys: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        keys.sort_unstable();
        keys.dedup();

        match (keys.is_empty(), is_development) {
            (false, _) => Ok(Self {
                api_keys: Arc::new(keys),
                enabled: true,
            }),
            (true, true) => {
                tracing::warn!("{API_KEYS_VAR} is empty; admin routes are open");
                Ok(Self {
                    api_keys: Arc::new(Vec::new()),
                    enabled: false,
                })
            }
            (true, false) => anyhow::bail!("{API_KEYS_VAR} must list at least one key"),
        }
    }

    fn allows(&self, token: &str) -> bool {
        // no short-circuit; every key is compared
        self.api_keys.iter().fold(false, |found, key| {
            found | bool::from(key.as_bytes().ct_eq(token.as_bytes()))
        })
    }
}

#[derive(Debug)]
struct Window {
    opened_at: Instant,
    used: usize,
}

/// Shared request budget for the admin routes: `max_requests` per `window`,
/// reset when the window elapses.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    current: Arc<Mutex<Window>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            current: Arc::new(Mutex::new(Window {
                opened_at: Instant::now(),
                used: 0,
            })),
        }
    }

    /// Takes one request from the budget, or returns how long until the
    /// window reopens.
    async fn acquire(&self) -> Result<(), Duration> {
        let mut current = self.current.lock().await;
        let elapsed = current.opened_at.elapsed();
        if elapsed >= self.window {
            *current = Window {
                opened_at: Instant::now(),
                used: 0,
            };
        } else if current.used >= self.max_requests {
            return Err(self.window - elapsed);
        }
        current.used += 1;
        Ok(())
    }
}

fn request_id_of(req: &Request) -> String {
    req.extensions()
        .get::<RequestId>()
        .map_or_else(String::new, |id| id.0.clone())
}

/// Adopts the caller's `x-request-id` when it is short printable ASCII,
/// otherwise mints a `UUIDv4`. The id is stored as a [`RequestId`]
/// extension and echoed on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map_or_else(|| Uuid::new_v4().to_string(), ToOwned::to_owned);

    req.extensions_mut().insert(RequestId(id.clone()));
    let mut res = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    match extract_bearer_token(req.headers().get(header::AUTHORIZATION)) {
        Some(token) if auth.allows(token) => next.run(req).await,
        _ => ApiError::new(
            request_id_of(&req),
            "unauthorized",
            "missing or invalid bearer token",
        )
        .into_response(),
    }
}

/// Rejects with 429 and a `Retry-After` once the window's budget is spent.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    match rate_limit.acquire().await {
        Ok(()) => next.run(req).await,
        Err(wait) => {
            let retry_after = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
            tracing::warn!(retry_after, "admin rate limit exceeded");
            let mut res =
                ApiError::new(request_id_of(&req), "rate_limited", "rate limit exceeded")
                    .into_response();
            res.headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
            res
        }
    }
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}
