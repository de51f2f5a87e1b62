/**
 * API REST HBI - Adaptateur HTTP au-dessus d'un Inventory partagé
 *
 * ROUTES :
 * - GET  /                 : ping
 * - GET  /health           : uptime + nombre d'hôtes
 * - POST /entities         : liste de HostRecord -> create_or_update
 * - POST /entities/search  : liste de FilterRecord (ou corps vide / null) -> get
 * - GET  /hosts, /hosts/{id}
 * - POST /reset            : vide l'index (isolation des tests)
 *
 * ERREURS : {"error": <catégorie>, "message": <texte>}, 400 pour InvalidHost et
 * InvalidQuery, 404 pour NotFound.
 */

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use hbi_core::{decode_filters, decode_hosts, HbiError, Host, HostInventory, Inventory};
use serde_json::Value;
use tracing::{debug, warn};

use crate::health::{HealthTracker, KernelHealth};

#[derive(Clone)]
pub struct AppState {
    pub inventory: Inventory,
    pub health_tracker: HealthTracker,
}

impl AppState {
    pub fn new(inventory: Inventory) -> Self {
        Self { inventory, health_tracker: HealthTracker::new() }
    }
}

/// HbiError rendue en réponse HTTP
#[derive(Debug)]
pub struct ApiError(pub HbiError);

impl From<HbiError> for ApiError {
    fn from(err: HbiError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            HbiError::InvalidHost(_) | HbiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            HbiError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        warn!(category = self.0.category(), status = status.as_u16(), "{}", self.0);
        let body = serde_json::json!({ "error": self.0.category(), "message": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/health", get(get_health))
        .route("/entities", post(create_or_update))
        .route("/entities/search", post(search))
        .route("/hosts", get(get_hosts))
        .route("/hosts/{id}", get(get_host))
        .route("/reset", post(reset))
        .with_state(app_state)
}

/// Corps vide (ou blanc) -> None
fn parse_body(body: &[u8]) -> Result<Option<Value>, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body).map(Some)
}

// GET /health
async fn get_health(State(app): State<AppState>) -> Json<KernelHealth> {
    Json(app.health_tracker.get_health(&app.inventory))
}

// POST /entities
async fn create_or_update(
    State(app): State<AppState>,
    body: Bytes,
) -> Result<Json<Vec<Host>>, ApiError> {
    let value = parse_body(&body)
        .map_err(|e| HbiError::InvalidHost(format!("Malformed JSON body: {e}")))?
        .ok_or_else(|| HbiError::InvalidHost("Expected a list of host records".into()))?;
    let hosts = decode_hosts(value)?;
    debug!(count = hosts.len(), "create_or_update");
    Ok(Json(app.inventory.create_or_update(hosts)?))
}

// POST /entities/search
async fn search(State(app): State<AppState>, body: Bytes) -> Result<Json<Vec<Host>>, ApiError> {
    let value = parse_body(&body)
        .map_err(|e| HbiError::InvalidQuery(format!("Malformed JSON body: {e}")))?
        .unwrap_or(Value::Null);
    let filters = decode_filters(value)?;
    debug!(filters = filters.len(), "search");
    Ok(Json(app.inventory.get(&filters)))
}

// GET /hosts
async fn get_hosts(State(app): State<AppState>) -> Json<Vec<Host>> {
    Json(app.inventory.get(&[]))
}

// GET /hosts/{id}
async fn get_host(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Host>, ApiError> {
    Ok(Json(app.inventory.get_by_id(&id)?))
}

// POST /reset
async fn reset(State(app): State<AppState>) -> StatusCode {
    app.inventory.reset();
    StatusCode::NO_CONTENT
}
