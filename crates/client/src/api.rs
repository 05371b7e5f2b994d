//! HTTP client for the loyalty API.
//!
//! Every call goes through [`ApiClient::request`], which injects the session's
//! bearer token and performs at most one silent refresh when the server
//! answers 401.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use loyalty_auth::{AuthPayload, RefreshRequest, RefreshResponse, TokenPair, User};
use loyalty_core::TenantSlug;

use crate::session::SessionStore;

/// Refresh-and-retry cycles allowed per request.
const MAX_AUTH_RETRIES: usize = 1;

const REFRESH_PATH: &str = "/auth/refresh";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The request never produced a response (DNS, connect, TLS, ...).
    Transport,
    /// The server answered with a non-success status.
    Server,
    /// A success response did not have the expected shape.
    Decode,
}

/// Failure of any API call: a human message plus an optional machine code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
    pub code: Option<String>,
    pub status: Option<u16>,
}

impl ApiError {
    pub const FALLBACK_MESSAGE: &'static str = "Request failed";

    pub fn transport(err: &reqwest::Error) -> Self {
        tracing::debug!(error = %err, "transport failure");
        Self {
            kind: ApiErrorKind::Transport,
            message: Self::FALLBACK_MESSAGE.to_string(),
            code: None,
            status: None,
        }
    }

    /// Build from a non-success response body.
    ///
    /// message: `message`, else `detail`, else the fallback.
    /// code: `code`, else `detail`, else none.
    pub fn from_body(status: StatusCode, body: &Value) -> Self {
        let field = |name: &str| body.get(name).and_then(Value::as_str).map(str::to_string);

        Self {
            kind: ApiErrorKind::Server,
            message: field("message")
                .or_else(|| field("detail"))
                .unwrap_or_else(|| Self::FALLBACK_MESSAGE.to_string()),
            code: field("code").or_else(|| field("detail")),
            status: Some(status.as_u16()),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Decode,
            message: message.into(),
            code: None,
            status: None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(StatusCode::UNAUTHORIZED.as_u16())
    }
}

/// Per-call options: method, extra headers and an optional JSON body.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    method: Method,
    headers: HeaderMap,
    body: Option<Value>,
    use_session: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            use_session: true,
        }
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post(body: Value) -> Self {
        Self::new(Method::POST).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Neither inject the session token nor attempt a refresh.
    ///
    /// For endpoints that authenticate by other means (login answers 401 on
    /// bad credentials, which must not trigger a refresh).
    pub fn without_session(mut self) -> Self {
        self.use_session = false;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    user: User,
    tokens: TokenPair,
}

/// Client for the loyalty REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: Arc<SessionStore>) -> Self {
        Self::with_http(reqwest::Client::new(), base_url, session)
    }

    pub fn with_http(
        http: reqwest::Client,
        base_url: impl Into<String>,
        session: Arc<SessionStore>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Perform a request and return the parsed JSON body.
    ///
    /// Empty or non-JSON bodies parse as `{}`. A 401 triggers one refresh of
    /// the token pair; if that succeeds the request is repeated once,
    /// otherwise the session is cleared and the original 401 is reported.
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<Value, ApiError> {
        let inject_auth = options.use_session && !options.headers.contains_key(AUTHORIZATION);

        let mut response = self.send(path, &options, inject_auth).await?;

        if options.use_session {
            for _ in 0..MAX_AUTH_RETRIES {
                if response.status() != StatusCode::UNAUTHORIZED {
                    break;
                }
                if !self.refresh_session().await {
                    break;
                }
                tracing::debug!(path, "retrying after token refresh");
                response = self.send(path, &options, inject_auth).await?;
            }
        }

        let status = response.status();
        let body = read_body(response).await;
        if !status.is_success() {
            let err = ApiError::from_body(status, &body);
            tracing::debug!(path, status = status.as_u16(), code = err.code.as_deref(), "request failed");
            return Err(err);
        }
        Ok(body)
    }

    /// [`ApiClient::request`] followed by deserialization into `T`.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let body = self.request(path, options).await?;
        serde_json::from_value(body)
            .map_err(|e| ApiError::decode(format!("unexpected response from {path}: {e}")))
    }

    /// `GET /{tenant}/auth/me`.
    pub async fn fetch_identity(&self, tenant: &TenantSlug) -> Result<User, ApiError> {
        self.request_json(&format!("/{tenant}/auth/me"), RequestOptions::get())
            .await
    }

    /// `POST /{tenant}/auth/login`; on success the session is replaced.
    pub async fn login(
        &self,
        tenant: &TenantSlug,
        credentials: &Credentials,
    ) -> Result<User, ApiError> {
        let body = serde_json::to_value(credentials)
            .map_err(|e| ApiError::decode(format!("failed to encode credentials: {e}")))?;

        let LoginResponse { user, tokens } = self
            .request_json(
                &format!("/{tenant}/auth/login"),
                RequestOptions::post(body).without_session(),
            )
            .await?;

        let payload = AuthPayload {
            user: user.clone(),
            tokens,
            tenant: tenant.clone(),
        };
        if let Err(err) = self.session.set_auth(payload) {
            tracing::warn!(error = %err, "logged in but failed to persist session");
        }
        tracing::info!(tenant = %tenant, user = %user.display_name(), role = %user.role, "logged in");
        Ok(user)
    }

    /// Check connectivity by hitting the server's `/healthz` endpoint.
    pub async fn health(&self) -> bool {
        let Ok(base) = reqwest::Url::parse(&self.base_url) else {
            return false;
        };
        let Ok(url) = base.join("/healthz") else {
            return false;
        };
        match self.http.get(url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn send(
        &self,
        path: &str,
        options: &RequestOptions,
        inject_auth: bool,
    ) -> Result<Response, ApiError> {
        let mut req = self
            .http
            .request(options.method.clone(), self.url(path))
            .headers(options.headers.clone());

        if inject_auth {
            if let Some(token) = self.session.access_token() {
                req = req.bearer_auth(token);
            }
        }
        if let Some(body) = &options.body {
            req = req.json(body);
        }

        tracing::debug!(method = %options.method, path, "api request");
        req.send().await.map_err(|e| ApiError::transport(&e))
    }

    /// Exchange the refresh token for a new pair.
    ///
    /// Returns `true` when the session now holds fresh tokens. Any failure
    /// clears the session.
    async fn refresh_session(&self) -> bool {
        let Some(refresh) = self.session.refresh_token() else {
            tracing::info!("access token rejected and no refresh token available");
            self.clear_session();
            return false;
        };

        match self.exchange_refresh(&refresh).await {
            Ok(tokens) => {
                if let Err(err) = self.session.update_tokens(tokens) {
                    tracing::warn!(error = %err, "refreshed tokens could not be persisted");
                }
                tracing::info!("access token refreshed");
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, code = err.code.as_deref(), "token refresh failed");
                self.clear_session();
                false
            }
        }
    }

    async fn exchange_refresh(&self, refresh: &str) -> Result<TokenPair, ApiError> {
        let response = self
            .http
            .post(self.url(REFRESH_PATH))
            .json(&RefreshRequest { refresh })
            .send()
            .await
            .map_err(|e| ApiError::transport(&e))?;

        let status = response.status();
        let body = read_body(response).await;
        if !status.is_success() {
            return Err(ApiError::from_body(status, &body));
        }

        let parsed: RefreshResponse = serde_json::from_value(body).unwrap_or_default();
        parsed
            .into_pair(refresh)
            .ok_or_else(|| ApiError::decode("refresh response did not contain an access token"))
    }

    fn clear_session(&self) {
        if let Err(err) = self.session.logout() {
            tracing::warn!(error = %err, "failed to remove persisted session");
        }
    }
}

async fn read_body(response: Response) -> Value {
    let empty = || Value::Object(Default::default());
    match response.bytes().await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|_| empty()),
        Err(_) => empty(),
    }
}
