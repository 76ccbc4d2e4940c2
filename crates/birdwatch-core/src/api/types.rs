//! Response types shared by the API server and its callers.

use serde::{Deserialize, Serialize};

use crate::parsed::Parsed;

/// Body of error responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// `/health` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub git_hash: String,
    pub build_profile: String,
    pub uptime_secs: u64,
}

/// Metadata attached to every successful query response under `api`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiInfo {
    pub version: String,
    pub result_from_cache: bool,
}

/// Query string of the lookup endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupQuery {
    /// Network address or prefix to look up.
    pub q: String,
}

/// Query string of `/routes/prefixed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefixQuery {
    pub prefix: String,
}

/// Successful query response: the payload with `api` merged in.
///
/// `api` is a reserved top-level key; the server drops a payload
/// field of that name before serializing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub api: ApiInfo,
    #[serde(flatten)]
    pub payload: Parsed,
}
