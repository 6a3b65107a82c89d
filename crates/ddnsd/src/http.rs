//! HTTP surface of the daemon
//!
//! Translates query parameters into an [`UpdateRequest`], runs it through
//! [`process_request`], and maps the outcome onto a status code and a small
//! JSON body:
//!
//! | Outcome                                    | Status | Body                  |
//! |--------------------------------------------|--------|-----------------------|
//! | Batch ran (even with failed domains)       | 200    | `{"result": "..."}`   |
//! | Missing parameters / no valid address      | 400    | `{"error": "..."}`    |
//! | Credential rejected                        | 401    | `{"error": "..."}`    |
//! | Update-only request, record missing        | 404    | `{"error": "..."}`    |
//! | Anything else (provider misconfiguration)  | 500    | `{"error": "..."}`    |

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use ddns_reconciler::{
    DdnsConfig, Error, ProviderRegistry, UpdateRequest, WriteMode, process_request,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared state for handlers
#[derive(Clone)]
pub struct AppState {
    registry: Arc<ProviderRegistry>,
    config: Arc<DdnsConfig>,
}

impl AppState {
    pub fn new(registry: Arc<ProviderRegistry>, config: DdnsConfig) -> Self {
        Self {
            registry,
            config: Arc::new(config),
        }
    }
}

/// Build the router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/update", get(update))
        .route("/update/existing", get(update_existing))
        .route("/health", get(health))
        .with_state(state)
}

/// Query parameters of the update endpoints
#[derive(Default)]
pub struct UpdateParams {
    cf_key: Option<String>,
    domain: Option<String>,
    ipv4: Option<String>,
    ipv6: Option<String>,
    proxy: Option<String>,
    log: Option<String>,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for UpdateParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateParams")
            .field("cf_key", &self.cf_key.as_ref().map(|_| "<REDACTED>"))
            .field("domain", &self.domain)
            .field("ipv4", &self.ipv4)
            .field("ipv6", &self.ipv6)
            .field("proxy", &self.proxy)
            .field("log", &self.log)
            .finish()
    }
}

impl UpdateParams {
    /// Collect known keys from decoded pairs; a repeated key keeps its last value
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "cf_key" => &mut params.cf_key,
                "domain" => &mut params.domain,
                "ipv4" => &mut params.ipv4,
                "ipv6" => &mut params.ipv6,
                "proxy" => &mut params.proxy,
                "log" => &mut params.log,
                _ => continue,
            };
            *slot = Some(value);
        }
        params
    }

    /// Build the library request; `bearer` is used when `cf_key` is absent
    fn into_request(self, bearer: Option<String>, mode: WriteMode) -> UpdateRequest {
        UpdateRequest {
            api_token: self.cf_key.filter(|key| !key.is_empty()).or(bearer),
            domains: self.domain.as_deref().map(parse_domains).unwrap_or_default(),
            ipv4: self.ipv4,
            ipv6: self.ipv6,
            proxied: flag(self.proxy.as_deref()),
            diagnostics: flag(self.log.as_deref()),
            mode,
        }
    }
}

/// Split a comma-separated domain list, dropping empty entries
fn parse_domains(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}

/// Only the exact string "true" enables a flag
fn flag(value: Option<&str>) -> bool {
    value == Some("true")
}

/// Token from an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::MissingParameters | Error::NoValidAddress => StatusCode::BAD_REQUEST,
        Error::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
        Error::RecordNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, error: &Error) -> Response {
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}

/// Shared body of the update handlers
async fn handle(
    state: &AppState,
    headers: &HeaderMap,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
    mode: WriteMode,
) -> Response {
    let params = match query {
        Ok(Query(pairs)) => UpdateParams::from_pairs(pairs),
        Err(rejection) => {
            debug!("Unreadable query string: {}", rejection);
            return error_response(StatusCode::BAD_REQUEST, &Error::MissingParameters);
        }
    };

    run(state, params.into_request(bearer_token(headers), mode)).await
}

async fn run(state: &AppState, request: UpdateRequest) -> Response {
    debug!(
        "Update request: {} domain(s), mode {:?}",
        request.domains.len(),
        request.mode
    );

    match process_request(state.registry.as_ref(), &state.config, request).await {
        Ok(report) => (
            StatusCode::OK,
            Json(json!({ "result": report.aggregate().as_str() })),
        )
            .into_response(),
        Err(e) => {
            let status = status_for(&e);
            warn!("Update request rejected ({}): {}", status.as_u16(), e);
            error_response(status, &e)
        }
    }
}

/// Batch upsert
async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Response {
    handle(&state, &headers, query, WriteMode::Upsert).await
}

/// Single-domain update of an existing record
async fn update_existing(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Response {
    handle(&state, &headers, query, WriteMode::UpdateOnly).await
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
