use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Role, UserProfile};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Gateway status
    pub status: String,
    /// Gateway version
    pub version: String,
    /// Backend the gateway talks to
    pub api_url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserProfile,
    /// Whether the mirror cookie survives a browser restart
    pub persistent: bool,
}

/// Claims summary of the presented credential
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionInfo {
    pub subject: Option<String>,
    pub role: Role,
    /// Expiry as RFC 3339
    pub expires_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    /// Backend id, numeric or string depending on the endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}
