//! Credential lookup against the HTTP backend.
//!
//! The worker logs in with its backend account, caches the session token,
//! then fetches each credential by key. A rejected token is dropped and
//! the lookup is retried once with a fresh session.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use crate::error::{CredentialError, CredentialResult};
use crate::resolver::CredentialResolver;

/// Backend connection settings.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL, e.g. `https://backend.example.com/api`
    pub base_url: Url,
    pub username: String,
    pub password: String,
    /// Request timeout
    pub timeout: Duration,
}

impl BackendConfig {
    /// Build from a hostname or URL. A bare hostname is served over https.
    pub fn new(
        hostname: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> CredentialResult<Self> {
        let hostname = hostname.trim();
        if hostname.is_empty() {
            return Err(CredentialError::InvalidConfig("backend hostname is empty".to_string()));
        }
        let raw = if hostname.contains("://") {
            hostname.to_string()
        } else {
            format!("https://{}", hostname)
        };
        let base_url = Url::parse(&raw)
            .map_err(|e| CredentialError::InvalidConfig(format!("{}: {}", hostname, e)))?;

        Ok(Self {
            base_url,
            username: username.into(),
            password: password.into(),
            timeout: Duration::from_secs(30),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }
}

#[derive(Serialize)]
struct SessionRequest<'a> {
    session: SessionCredentials<'a>,
}

#[derive(Serialize)]
struct SessionCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct SessionResponse {
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct CredentialResponse {
    data: Option<CredentialData>,
}

#[derive(Deserialize)]
struct CredentialData {
    value: Option<String>,
}

/// Resolves credentials through the backend REST API.
pub struct HttpCredentialResolver {
    http: Client,
    config: BackendConfig,
    token: RwLock<Option<String>>,
}

impl HttpCredentialResolver {
    pub fn new(config: BackendConfig) -> CredentialResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("ffw-credentials/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(CredentialError::Network)?;

        Ok(Self {
            http,
            config,
            token: RwLock::new(None),
        })
    }

    /// Invalidate the cached session token.
    pub async fn invalidate(&self) {
        *self.token.write().await = None;
    }

    async fn session_token(&self) -> CredentialResult<String> {
        if let Some(token) = self.token.read().await.as_ref() {
            return Ok(token.clone());
        }

        let mut cache = self.token.write().await;
        if let Some(token) = cache.as_ref() {
            return Ok(token.clone());
        }

        let token = self.login().await?;
        *cache = Some(token.clone());
        Ok(token)
    }

    async fn login(&self) -> CredentialResult<String> {
        debug!("Opening backend session as {}", self.config.username);

        let body = SessionRequest {
            session: SessionCredentials {
                email: &self.config.username,
                password: &self.config.password,
            },
        };
        let response = self
            .http
            .post(self.config.endpoint("sessions"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CredentialError::auth_error(format!(
                "backend login rejected ({})",
                status.as_u16()
            )));
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| CredentialError::invalid_response(format!("session: {}", e)))?;
        session
            .access_token
            .ok_or_else(|| CredentialError::invalid_response("session response has no access_token"))
    }

    /// Fetch one credential. `Ok(None)` means the token was rejected.
    async fn fetch(&self, token: &str, key: &str) -> CredentialResult<Option<String>> {
        let url = self
            .config
            .endpoint(&format!("credentials/{}", urlencoding::encode(key)));
        let response = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(CredentialError::from_http_status(status.as_u16(), key));
        }

        let credential: CredentialResponse = response
            .json()
            .await
            .map_err(|e| CredentialError::invalid_response(format!("{}: {}", key, e)))?;
        credential
            .data
            .and_then(|data| data.value)
            .map(Some)
            .ok_or_else(|| CredentialError::invalid_response(format!("{}: response has no data.value", key)))
    }
}

#[async_trait]
impl CredentialResolver for HttpCredentialResolver {
    async fn resolve(&self, key: &str) -> CredentialResult<String> {
        let token = self.session_token().await?;
        if let Some(value) = self.fetch(&token, key).await? {
            return Ok(value);
        }

        debug!("Session token rejected, logging in again");
        self.invalidate().await;
        let token = self.session_token().await?;
        self.fetch(&token, key)
            .await?
            .ok_or_else(|| CredentialError::from_http_status(401, key))
    }
}
