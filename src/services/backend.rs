//! Client for the BioConnect REST backend.
//!
//! Every authenticated call carries `Authorization: Bearer <token>`; a
//! credential that is already expired is rejected locally without touching
//! the network. Non-2xx answers are turned into [`AppError::Backend`] with the
//! backend's message and field-level errors when it sends them.

use std::collections::HashMap;

use reqwest::{Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{LoginRequest, RegisterRequest, RegisterResponse, Role, UserProfile};
use crate::services::session_store::SessionStore;
use crate::services::token;

/// User payload as the backend sends it
#[derive(Debug, Clone, Deserialize)]
struct BackendUser {
    id: serde_json::Value,
    #[serde(default)]
    nome: String,
    #[serde(default)]
    email: String,
    login: String,
    tipo: Option<String>,
    role: Option<String>,
    ativo: Option<bool>,
    instituicao: Option<String>,
    curso: Option<String>,
}

impl From<BackendUser> for UserProfile {
    fn from(user: BackendUser) -> Self {
        let id = match user.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        let role = user
            .tipo
            .as_deref()
            .or(user.role.as_deref())
            .map(Role::normalize)
            .unwrap_or_default();

        Self {
            id,
            display_name: user.nome,
            email: user.email,
            login: user.login,
            role,
            active: user.ativo.unwrap_or(true),
            institution: user.instituicao,
            course: user.curso,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
    user: Option<BackendUser>,
    message: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
    #[serde(default)]
    errors: HashMap<String, String>,
}

#[derive(Clone, Debug)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn bearer(&self, method: Method, path: &str, token: &str) -> Result<RequestBuilder> {
        if token::is_expired(token) {
            return Err(AppError::Unauthorized(
                "Session expired, please sign in again".to_string(),
            ));
        }
        Ok(self.http.request(method, self.url(path)).bearer_auth(token))
    }

    /// Exchange credentials for a token and the user's profile.
    ///
    /// The profile comes from the login answer, or from `/auth/me` when the
    /// backend omits it. With `master_superuser` on, the `master` login is
    /// always stored as ADMIN.
    pub async fn authenticate(
        &self,
        request: &LoginRequest,
        master_superuser: bool,
    ) -> Result<(String, UserProfile)> {
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(request)
            .send()
            .await?;
        let body: LoginResponse = parse(response).await?;

        let token = body.token.ok_or_else(|| {
            AppError::Unauthorized(
                body.message
                    .or(body.error)
                    .unwrap_or_else(|| "Login failed".to_string()),
            )
        })?;

        let mut profile = match body.user {
            Some(user) => UserProfile::from(user),
            None => self.current_user(&token).await?,
        };

        if master_superuser && profile.is_master() {
            profile.role = Role::Admin;
        }

        tracing::info!(login = %profile.login, role = %profile.role, "user authenticated");
        Ok((token, profile))
    }

    /// Log in and persist the session in `store`
    pub async fn sign_in(
        &self,
        store: &SessionStore,
        request: &LoginRequest,
        master_superuser: bool,
    ) -> Result<UserProfile> {
        let (token, profile) = self.authenticate(request, master_superuser).await?;
        store.save_session(&token, &profile, request.remember_me)?;
        Ok(profile)
    }

    /// Profile of the credential's owner
    pub async fn current_user(&self, token: &str) -> Result<UserProfile> {
        let user: BackendUser = self.get_json("/auth/me", token).await?;
        Ok(user.into())
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse> {
        let response = self
            .http
            .post(self.url("/auth/register"))
            .json(request)
            .send()
            .await?;
        parse(response).await
    }

    /// Authenticated GET with the stored credential.
    ///
    /// The session is cleared when the credential has expired locally or the
    /// backend answers 401.
    pub async fn get_json_with<T: DeserializeOwned>(&self, store: &SessionStore, path: &str) -> Result<T> {
        let token = session_credential(store)?;
        forget_on_unauthorized(store, self.get_json(path, &token).await)
    }

    pub async fn send_json_with<B, T>(
        &self,
        store: &SessionStore,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let token = session_credential(store)?;
        forget_on_unauthorized(store, self.send_json(method, path, &token, body).await)
    }

    pub async fn delete_with(&self, store: &SessionStore, path: &str) -> Result<()> {
        let token = session_credential(store)?;
        forget_on_unauthorized(store, self.delete(path, &token).await)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T> {
        let response = self.bearer(Method::GET, path, token)?.send().await?;
        parse(response).await
    }

    pub async fn send_json<B, T>(&self, method: Method, path: &str, token: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.bearer(method, path, token)?.json(body).send().await?;
        parse(response).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> Result<()> {
        let response = self.bearer(Method::DELETE, path, token)?.send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from(response).await)
        }
    }
}

fn session_credential(store: &SessionStore) -> Result<String> {
    // is_authenticated clears an expired session as a side effect
    if !store.is_authenticated() {
        return Err(AppError::Unauthorized(
            "Session expired, please sign in again".to_string(),
        ));
    }
    store
        .credential()
        .ok_or_else(|| AppError::Unauthorized("Not signed in".to_string()))
}

fn forget_on_unauthorized<T>(store: &SessionStore, result: Result<T>) -> Result<T> {
    if let Err(AppError::Backend { status: 401, .. }) = &result {
        tracing::info!("backend rejected the stored credential, clearing session");
        store.clear_session();
    }
    result
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
    if !response.status().is_success() {
        return Err(error_from(response).await);
    }
    Ok(response.json::<T>().await?)
}

async fn error_from(response: Response) -> AppError {
    let status = response.status();
    let body: ErrorBody = response.json().await.unwrap_or_default();
    let message = body.message.or(body.error).unwrap_or_else(|| {
        format!(
            "Error {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("unknown")
        )
    });

    tracing::warn!(status = status.as_u16(), "backend error: {}", message);

    AppError::Backend {
        status: status.as_u16(),
        message,
        field_errors: body.errors,
    }
}
