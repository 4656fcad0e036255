//! Authentication-related models

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Role granted to a BioConnect user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Lenient role parsing shared by claims and backend payloads.
    ///
    /// Any administrator spelling maps to `Admin`, everything else to `User`.
    pub fn normalize(value: &str) -> Self {
        let upper = value.trim().to_uppercase();
        let bare = upper.strip_prefix("ROLE_").unwrap_or(&upper);
        match bare {
            "ADMIN" | "ADMINISTRATOR" | "ADMINISTRADOR" | "ROOT" => Role::Admin,
            _ => Role::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Role::normalize(&raw))
    }
}

/// Denormalized user snapshot cached alongside the credential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "nome")]
    pub display_name: String,
    pub email: String,
    pub login: String,
    #[serde(rename = "tipo", alias = "role", default)]
    pub role: Role,
    #[serde(rename = "ativo", default = "default_active")]
    pub active: bool,
    #[serde(rename = "instituicao", default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(rename = "curso", default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
}

impl UserProfile {
    /// Whether the login is the hardcoded superuser account
    pub fn is_master(&self) -> bool {
        self.login.eq_ignore_ascii_case("master")
    }
}

fn default_active() -> bool {
    true
}

// Backend ids are numeric on some endpoints and UUIDs on others
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "invalid user id: {}",
            other
        ))),
    }
}
