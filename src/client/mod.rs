//! HTTP client for the gymdesk API.
//!
//! `SessionStore` is the single source of truth for the signed-in user and
//! their token; it is passed in explicitly and optionally persisted to a JSON
//! file so CLI invocations share a login. `ApiClient` attaches the token,
//! decodes the error envelope and clears the session whenever the server
//! answers 401.

use parking_lot::{Mutex, RwLock};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::db::{MemberResponse, UserResponse};
use crate::services::PageMeta;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with an error envelope
    #[error("{message} ({status})")]
    Api {
        status: u16,
        code: String,
        message: String,
        details: Option<Value>,
    },

    #[error("Not logged in. Run `gymdesk login` first.")]
    NotAuthenticated,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("session file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Field errors of a 422 response
    pub fn field_errors(&self, field: &str) -> Vec<String> {
        match self {
            ClientError::Api {
                details: Some(details),
                ..
            } => details
                .get(field)
                .and_then(Value::as_array)
                .map(|messages| {
                    messages
                        .iter()
                        .filter_map(|m| m.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// What the session store remembers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub token: Option<String>,
    pub user: Option<UserResponse>,
}

#[derive(Debug, Default)]
pub struct SessionStore {
    state: RwLock<SessionState>,
    path: Option<PathBuf>,
}

impl SessionStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// An unpersisted session holding only a token (e.g. from `--token`)
    pub fn with_token(token: String) -> Self {
        Self {
            state: RwLock::new(SessionState {
                token: Some(token),
                user: None,
            }),
            path: None,
        }
    }

    /// Open a store backed by `path`; a missing file is an empty session
    pub fn load(path: impl Into<PathBuf>) -> ClientResult<Self> {
        let path = path.into();
        let state = if path.exists() {
            serde_json::from_str(&std::fs::read_to_string(&path)?)?
        } else {
            SessionState::default()
        };
        Ok(Self {
            state: RwLock::new(state),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn token(&self) -> Option<String> {
        self.state.read().token.clone()
    }

    pub fn user(&self) -> Option<UserResponse> {
        self.state.read().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().token.is_some()
    }

    pub fn set(&self, token: String, user: UserResponse) -> ClientResult<()> {
        let mut state = self.state.write();
        state.token = Some(token);
        state.user = Some(user);
        self.persist(&state)
    }

    pub fn update_user(&self, user: UserResponse) -> ClientResult<()> {
        let mut state = self.state.write();
        state.user = Some(user);
        self.persist(&state)
    }

    pub fn clear(&self) -> ClientResult<()> {
        let mut state = self.state.write();
        *state = SessionState::default();
        match &self.path {
            Some(path) if path.exists() => Ok(std::fs::remove_file(path)?),
            _ => Ok(()),
        }
    }

    fn persist(&self, state: &SessionState) -> ClientResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(state)?)?;
        Ok(())
    }
}

/// A page of members as returned by the listing endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MemberList {
    pub data: Vec<MemberResponse>,
    pub meta: PageMeta,
}

/// Listing parameters
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// `active` restricts to active memberships
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Last fetched data, dropped whenever a mutation may have made it stale
#[derive(Debug, Default)]
pub struct MemberCache {
    pub members: Option<MemberList>,
    pub own_profile: Option<MemberResponse>,
}

impl MemberCache {
    fn invalidate(&mut self) {
        self.members = None;
        self.own_profile = None;
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorPayload,
}

#[derive(Deserialize)]
struct ErrorPayload {
    code: String,
    message: String,
    #[serde(default)]
    details: Option<Value>,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: UserResponse,
}

#[derive(Deserialize)]
struct LoginEnvelope {
    user: UserResponse,
    token: String,
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct RevokedEnvelope {
    revoked: u64,
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<SessionStore>,
    cache: Mutex<MemberCache>,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Arc<SessionStore>) -> ClientResult<Self> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            cache: Mutex::new(MemberCache::default()),
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn cached_members(&self) -> Option<MemberList> {
        self.cache.lock().members.clone()
    }

    pub fn cached_profile(&self) -> Option<MemberResponse> {
        self.cache.lock().own_profile.clone()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .header(reqwest::header::ACCEPT, "application/json");
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn authed(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        if !self.session.is_authenticated() {
            return Err(ClientError::NotAuthenticated);
        }
        Ok(self.request(method, path))
    }

    /// Send a request and decode either the body or the error envelope
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await?;
            let body: &[u8] = if bytes.is_empty() { b"null" } else { &bytes[..] };
            return Ok(serde_json::from_slice(body)?);
        }

        if status == StatusCode::UNAUTHORIZED {
            tracing::debug!("Server rejected the session; clearing local state");
            self.session.clear()?;
            self.cache.lock().invalidate();
        }

        let text = response.text().await.unwrap_or_default();
        Err(match serde_json::from_str::<ErrorEnvelope>(&text) {
            Ok(envelope) => ClientError::Api {
                status: status.as_u16(),
                code: envelope.error.code,
                message: envelope.error.message,
                details: envelope.error.details,
            },
            Err(_) => ClientError::Api {
                status: status.as_u16(),
                code: "unexpected_response".to_string(),
                message: if text.is_empty() {
                    status.to_string()
                } else {
                    text
                },
                details: None,
            },
        })
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        password_confirmation: &str,
    ) -> ClientResult<UserResponse> {
        let body = json!({
            "name": name,
            "email": email,
            "password": password,
            "password_confirmation": password_confirmation,
        });
        let envelope: UserEnvelope = self
            .send(self.request(Method::POST, "/api/auth/register").json(&body))
            .await?;
        Ok(envelope.user)
    }

    /// Log in and remember the session
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<UserResponse> {
        let body = json!({ "email": email, "password": password });
        let envelope: LoginEnvelope = self
            .send(self.request(Method::POST, "/api/auth/login").json(&body))
            .await?;

        self.cache.lock().invalidate();
        self.session.set(envelope.token, envelope.user.clone())?;
        Ok(envelope.user)
    }

    /// Revoke the current token. Local state is cleared even if the server
    /// call fails.
    pub async fn logout(&self) -> ClientResult<()> {
        let result = match self.authed(Method::POST, "/api/auth/logout") {
            Ok(builder) => self.send::<Value>(builder).await.map(|_| ()),
            Err(ClientError::NotAuthenticated) => Ok(()),
            Err(e) => Err(e),
        };

        self.cache.lock().invalidate();
        self.session.clear()?;
        result
    }

    /// Revoke every token of the user, returning how many were revoked
    pub async fn logout_all(&self) -> ClientResult<u64> {
        let result = self
            .send::<RevokedEnvelope>(self.authed(Method::POST, "/api/auth/logout-all")?)
            .await;

        self.cache.lock().invalidate();
        self.session.clear()?;
        Ok(result?.revoked)
    }

    /// Refresh the signed-in user, including their member profile
    pub async fn me(&self) -> ClientResult<UserResponse> {
        let envelope: UserEnvelope = self
            .send(self.authed(Method::GET, "/api/auth/me")?)
            .await?;

        self.cache.lock().own_profile = envelope.user.member_profile.as_deref().cloned();
        self.session.update_user(envelope.user.clone())?;
        Ok(envelope.user)
    }

    pub async fn list_members(&self, params: &ListParams) -> ClientResult<MemberList> {
        let list: MemberList = self
            .send(self.authed(Method::GET, "/api/members")?.query(params))
            .await?;
        self.cache.lock().members = Some(list.clone());
        Ok(list)
    }

    pub async fn get_member(&self, id: i64) -> ClientResult<MemberResponse> {
        let envelope: DataEnvelope<MemberResponse> = self
            .send(self.authed(Method::GET, &format!("/api/members/{}", id))?)
            .await?;
        Ok(envelope.data)
    }

    pub async fn create_member(&self, input: &Value) -> ClientResult<MemberResponse> {
        let envelope: DataEnvelope<MemberResponse> = self
            .send(self.authed(Method::POST, "/api/members")?.json(input))
            .await?;
        self.remember_own_profile(&envelope.data);
        Ok(envelope.data)
    }

    /// Partial update: only the keys present in `input` are changed
    pub async fn update_member(&self, id: i64, input: &Value) -> ClientResult<MemberResponse> {
        let envelope: DataEnvelope<MemberResponse> = self
            .send(
                self.authed(Method::PATCH, &format!("/api/members/{}", id))?
                    .json(input),
            )
            .await?;
        self.remember_own_profile(&envelope.data);
        Ok(envelope.data)
    }

    pub async fn delete_member(&self, id: i64) -> ClientResult<()> {
        self.send::<Value>(self.authed(Method::DELETE, &format!("/api/members/{}", id))?)
            .await?;
        self.cache.lock().invalidate();
        Ok(())
    }

    pub async fn restore_member(&self, id: i64) -> ClientResult<MemberResponse> {
        let envelope: DataEnvelope<MemberResponse> = self
            .send(self.authed(Method::POST, &format!("/api/members/{}/restore", id))?)
            .await?;
        self.remember_own_profile(&envelope.data);
        Ok(envelope.data)
    }

    pub async fn expiring_members(&self, days: Option<i64>) -> ClientResult<Vec<MemberResponse>> {
        let mut builder = self.authed(Method::GET, "/api/members/expiring")?;
        if let Some(days) = days {
            builder = builder.query(&[("days", days)]);
        }
        let envelope: DataEnvelope<Vec<MemberResponse>> = self.send(builder).await?;
        Ok(envelope.data)
    }

    /// A mutation made the listing stale and returned the caller's own profile
    fn remember_own_profile(&self, profile: &MemberResponse) {
        let mut cache = self.cache.lock();
        cache.members = None;
        cache.own_profile = Some(profile.clone());
    }
}
