//! Sign-in, sign-out and session validation against the identity service.

use serde::Deserialize;

use crate::session::Session;
use crate::GastoClient;

pub const NOT_AUTHENTICATED: &str = "Usuario no autenticado";
pub const NO_SESSION_TOKEN: &str = "Token de sesión no disponible";

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| chrono::Utc::now().timestamp() + secs));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            user_id: self.user.id,
            email: self.user.email,
            expires_at,
        }
    }
}

/// Pull a readable message out of an identity-service error body.
fn auth_error_message(status: reqwest::StatusCode, text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|json| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|k| json.get(*k).and_then(|v| v.as_str()).map(String::from))
        })
        .unwrap_or_else(|| format!("Login failed: {} - {}", status, text))
}

impl GastoClient {
    /// POST /auth/v1/token?grant_type=password -> stored session
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, String> {
        let url = format!("{}/auth/v1/token", self.config.supabase_url);
        let body = serde_json::json!({ "email": email, "password": password });
        self.request_token(&url, "password", &body).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, String> {
        let url = format!("{}/auth/v1/token", self.config.supabase_url);
        let body = serde_json::json!({ "refresh_token": refresh_token });
        self.request_token(&url, "refresh_token", &body).await
    }

    async fn request_token(
        &self,
        url: &str,
        grant_type: &str,
        body: &serde_json::Value,
    ) -> Result<Session, String> {
        let resp = self
            .http
            .post(url)
            .query(&[("grant_type", grant_type)])
            .headers(self.service_headers(None)?)
            .json(body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| e.to_string())?;
        if !status.is_success() {
            return Err(auth_error_message(status, &text));
        }
        let token: TokenResponse = serde_json::from_str(&text).map_err(|e| e.to_string())?;
        let session = token.into_session();
        self.sessions.save(&session)?;
        log::info!("signed in user {} ({})", session.user_id, grant_type);
        Ok(session)
    }

    /// Revoke the session server-side (best effort) and forget it locally.
    pub async fn sign_out(&self) -> Result<(), String> {
        if let Some(session) = self.sessions.load()? {
            let url = format!("{}/auth/v1/logout", self.config.supabase_url);
            let result = self
                .http
                .post(&url)
                .headers(self.service_headers(Some(&session.access_token))?)
                .send()
                .await;
            if let Err(e) = result {
                log::warn!("sign_out: logout request failed: {}", e);
            }
        }
        self.sessions.clear()
    }

    /// Stored session, refreshed if it has expired.
    pub(crate) async fn active_session(&self) -> Result<Session, String> {
        let session = self.sessions.load()?.ok_or_else(|| NOT_AUTHENTICATED.to_string())?;
        if !session.is_expired(chrono::Utc::now().timestamp()) {
            return Ok(session);
        }
        let Some(refresh_token) = session.refresh_token.as_deref() else {
            self.sessions.clear()?;
            return Err(NOT_AUTHENTICATED.to_string());
        };
        match self.refresh_session(refresh_token).await {
            Ok(fresh) => Ok(fresh),
            Err(e) => {
                log::warn!("session refresh failed: {}", e);
                self.sessions.clear()?;
                Err(NOT_AUTHENTICATED.to_string())
            }
        }
    }

    /// Access token of the active session.
    pub async fn access_token(&self) -> Result<String, String> {
        self.active_session()
            .await
            .map(|s| s.access_token)
            .map_err(|_| NO_SESSION_TOKEN.to_string())
    }

    /// GET /auth/v1/user - the server's view of the signed-in user.
    pub async fn current_user(&self) -> Result<AuthUser, String> {
        let session = self.active_session().await?;
        let url = format!("{}/auth/v1/user", self.config.supabase_url);
        let resp = self
            .http
            .get(&url)
            .headers(self.service_headers(Some(&session.access_token))?)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(NOT_AUTHENTICATED.to_string());
        }
        let text = resp.text().await.map_err(|e| e.to_string())?;
        if !status.is_success() {
            return Err(format!("{} {}", status, text));
        }
        serde_json::from_str(&text).map_err(|e| e.to_string())
    }
}
