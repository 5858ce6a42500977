mod qr_codes;

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use qrshop_shopify::{AdminClient, ShopifyError};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};
use crate::public;

/// Header the embedding admin sets to the merchant's `*.myshopify.com` domain.
pub(crate) const SHOP_HEADER: &str = "x-shopify-shop-domain";

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub shopify: Arc<AdminClient>,
    /// Public origin of this app, used to build scan URLs.
    pub app_url: String,
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    /// Per-field messages for `validation_error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(crate) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
                fields: None,
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    pub fn validation(request_id: impl Into<String>, errors: &qrshop_core::ValidationErrors) -> Self {
        let mut err = Self::new(request_id, "validation_error", "the QR code is invalid");
        err.error.fields = Some(
            errors
                .iter()
                .map(|(field, message)| ((*field).to_owned(), message.clone()))
                .collect(),
        );
        err
    }

    pub fn not_found(request_id: impl Into<String>, what: &str) -> Self {
        Self::new(request_id, "not_found", format!("{what} not found"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" => StatusCode::BAD_REQUEST,
            "validation_error" => StatusCode::UNPROCESSABLE_ENTITY,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(crate) fn map_db_error(request_id: String, error: &qrshop_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(crate) fn map_shopify_error(request_id: String, error: &ShopifyError) -> ApiError {
    tracing::error!(error = %error, "shopify product lookup failed");
    ApiError::new(request_id, "upstream_error", "product lookup failed")
}

pub(crate) fn map_core_error(request_id: String, error: &qrshop_core::CoreError) -> ApiError {
    tracing::error!(error = %error, "stored QR code is unusable");
    ApiError::new(request_id, "internal_error", error.to_string())
}

/// The shop a protected request acts for, as a lowercase
/// `{name}.myshopify.com` domain. Anything else is rejected before it can
/// reach the Admin API or a stored record.
pub(crate) fn require_shop(headers: &HeaderMap, request_id: &str) -> Result<String, ApiError> {
    let raw = headers
        .get(SHOP_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ApiError::new(
                request_id,
                "bad_request",
                format!("missing {SHOP_HEADER} header"),
            )
        })?;
    qrshop_shopify::normalize_shop_domain(raw).map_err(|e| {
        tracing::warn!(error = %e, "rejected shop header");
        ApiError::new(
            request_id,
            "bad_request",
            format!("{SHOP_HEADER} must be a *.myshopify.com domain"),
        )
    })
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static(SHOP_HEADER),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/qrcodes",
            get(qr_codes::list_qr_codes).post(qr_codes::create_qr_code),
        )
        .route("/api/v1/qrcodes/new", get(qr_codes::new_qr_code))
        .route(
            "/api/v1/qrcodes/{id}",
            get(qr_codes::get_qr_code)
                .put(qr_codes::update_qr_code)
                .delete(qr_codes::delete_qr_code),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new()
        .route("/api/v1/health", get(health))
        .route("/qrcodes/{id}", get(public::qr_code_page))
        .route("/qrcodes/{id}/image", get(public::qr_code_image))
        .route("/qrcodes/{id}/scan", get(public::scan_qr_code));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match qrshop_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}
