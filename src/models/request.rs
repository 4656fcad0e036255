use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Role;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub login: String,
    pub senha: String,
    /// Keep the session across browser restarts
    #[serde(default, alias = "rememberMe", skip_serializing)]
    pub remember_me: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RegisterRequest {
    pub login: String,
    pub senha: String,
    pub nome: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}
