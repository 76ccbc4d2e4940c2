//! API server: axum HTTP router over TCP.

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::info;

use super::types::*;
use crate::client::BirdClient;
use crate::daemon::ShutdownSignal;
use crate::outcome::{Fetched, Outcome};

/// Shared state accessible to all route handlers.
pub struct ApiState {
    pub client: Arc<BirdClient>,
    pub started_at: Instant,
}

impl ApiState {
    pub fn new(client: Arc<BirdClient>) -> Self {
        Self {
            client,
            started_at: Instant::now(),
        }
    }
}

/// Build the axum router with all query routes.
pub fn router(state: Arc<ApiState>) -> axum::Router {
    axum::Router::new()
        .route("/health", get(handle_health))
        .route("/status", get(handle_status))
        .route("/protocols", get(handle_protocols))
        .route("/protocols/bgp", get(handle_protocols_bgp))
        .route("/symbols", get(handle_symbols))
        .route("/routes/dump", get(handle_routes_dump))
        .route("/routes/prefixed", get(handle_routes_prefixed))
        .route("/routes/protocol/{protocol}", get(handle_routes_proto))
        .route("/routes/protocol/{protocol}/count", get(handle_routes_proto_count))
        .route("/routes/filtered/{protocol}", get(handle_routes_filtered))
        .route("/routes/export/{protocol}", get(handle_routes_export))
        .route("/routes/export/{protocol}/count", get(handle_routes_export_count))
        .route("/routes/noexport/{protocol}", get(handle_routes_noexport))
        .route("/routes/table/{table}", get(handle_routes_table))
        .route("/routes/table/{table}/count", get(handle_routes_table_count))
        .route("/routes/lookup/table/{table}", get(handle_lookup_table))
        .route("/routes/lookup/protocol/{protocol}", get(handle_lookup_protocol))
        .route("/routes/peer/{peer}", get(handle_routes_peer))
        .with_state(state)
}

/// Serve the API on `listener` until the shutdown signal is received.
pub async fn serve(
    listener: TcpListener,
    state: Arc<ApiState>,
    mut shutdown_rx: broadcast::Receiver<ShutdownSignal>,
) -> Result<(), std::io::Error> {
    info!(addr = %listener.local_addr()?, "HTTP API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("HTTP API shutting down");
        })
        .await
}

fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Top-level key of the response metadata in successful responses.
const API_FIELD: &str = "api";

/// Map a query result onto an HTTP response.
pub(crate) fn respond(fetched: Fetched) -> Response {
    match fetched.outcome {
        Outcome::Ready(mut payload) => {
            payload.remove(API_FIELD);
            Json(ReadyResponse {
                api: ApiInfo {
                    version: crate::build_info::VERSION.to_string(),
                    result_from_cache: fetched.from_cache,
                },
                payload,
            })
            .into_response()
        }
        Outcome::Unreachable => error(StatusCode::SERVICE_UNAVAILABLE, "bird unreachable"),
        Outcome::NotAdmitted => error(StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded"),
    }
}

// ── Route handlers ──────────────────────────────────────────────────────

async fn handle_health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::build_info::VERSION.to_string(),
        git_hash: crate::build_info::GIT_HASH.to_string(),
        build_profile: crate::build_info::BUILD_PROFILE.to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

async fn handle_status(State(state): State<Arc<ApiState>>) -> Response {
    respond(state.client.status().await)
}

async fn handle_protocols(State(state): State<Arc<ApiState>>) -> Response {
    respond(state.client.protocols().await)
}

async fn handle_protocols_bgp(State(state): State<Arc<ApiState>>) -> Response {
    respond(state.client.protocols_bgp().await)
}

async fn handle_symbols(State(state): State<Arc<ApiState>>) -> Response {
    respond(state.client.symbols().await)
}

async fn handle_routes_dump(State(state): State<Arc<ApiState>>) -> Response {
    respond(state.client.routes_dump().await)
}

async fn handle_routes_prefixed(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<PrefixQuery>,
) -> Response {
    respond(state.client.routes_prefixed(&query.prefix).await)
}

async fn handle_routes_proto(
    State(state): State<Arc<ApiState>>,
    Path(protocol): Path<String>,
) -> Response {
    respond(state.client.routes_proto(&protocol).await)
}

async fn handle_routes_proto_count(
    State(state): State<Arc<ApiState>>,
    Path(protocol): Path<String>,
) -> Response {
    respond(state.client.routes_proto_count(&protocol).await)
}

async fn handle_routes_filtered(
    State(state): State<Arc<ApiState>>,
    Path(protocol): Path<String>,
) -> Response {
    respond(state.client.routes_filtered(&protocol).await)
}

async fn handle_routes_export(
    State(state): State<Arc<ApiState>>,
    Path(protocol): Path<String>,
) -> Response {
    respond(state.client.routes_export(&protocol).await)
}

async fn handle_routes_export_count(
    State(state): State<Arc<ApiState>>,
    Path(protocol): Path<String>,
) -> Response {
    respond(state.client.routes_export_count(&protocol).await)
}

async fn handle_routes_noexport(
    State(state): State<Arc<ApiState>>,
    Path(protocol): Path<String>,
) -> Response {
    respond(state.client.routes_noexport(&protocol).await)
}

async fn handle_routes_table(
    State(state): State<Arc<ApiState>>,
    Path(table): Path<String>,
) -> Response {
    respond(state.client.routes_table(&table).await)
}

async fn handle_routes_table_count(
    State(state): State<Arc<ApiState>>,
    Path(table): Path<String>,
) -> Response {
    respond(state.client.routes_table_count(&table).await)
}

async fn handle_lookup_table(
    State(state): State<Arc<ApiState>>,
    Path(table): Path<String>,
    Query(query): Query<LookupQuery>,
) -> Response {
    respond(state.client.routes_lookup_table(&query.q, &table).await)
}

async fn handle_lookup_protocol(
    State(state): State<Arc<ApiState>>,
    Path(protocol): Path<String>,
    Query(query): Query<LookupQuery>,
) -> Response {
    respond(state.client.routes_lookup_protocol(&query.q, &protocol).await)
}

async fn handle_routes_peer(
    State(state): State<Arc<ApiState>>,
    Path(peer): Path<String>,
) -> Response {
    respond(state.client.routes_peer(&peer).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsed::object;
    use serde_json::json;

    async fn body_json(resp: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_ready_carries_api_object() {
        let fetched = Fetched::ready(object(json!({"symbols": {}})), true);
        let resp = respond(fetched);
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        assert_eq!(body["api"]["result_from_cache"], true);
        assert_eq!(body["api"]["version"], crate::build_info::VERSION);
        assert!(body["symbols"].is_object());
    }

    #[tokio::test]
    async fn test_payload_api_key_is_replaced() {
        let fetched = Fetched::ready(object(json!({"api": "from bird", "routes": []})), false);
        let resp = respond(fetched);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();

        let text = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(text.matches("\"api\"").count(), 1);

        let body: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(body["api"]["result_from_cache"], false);
        assert_eq!(body["routes"], json!([]));
    }

    #[tokio::test]
    async fn test_unreachable_is_503() {
        let resp = respond(Fetched::unreachable());
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(resp).await["error"], "bird unreachable");
    }

    #[tokio::test]
    async fn test_not_admitted_is_429() {
        let resp = respond(Fetched::not_admitted());
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body_json(resp).await["error"], "rate limit exceeded");
    }
}
