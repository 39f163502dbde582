//! Tenant access token retrieval and caching

use anyhow::{Context, Result, bail};
use tokio::sync::Mutex;

use super::config::ClientConfig;
use super::models::{TenantTokenRequest, TenantTokenResponse, TokenInfo};

const TOKEN_PATH: &str = "auth/v3/tenant_access_token/internal";

/// App credentials
#[derive(Clone)]
pub struct Credentials {
    pub app_id: String,
    pub app_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("app_secret", &"***")
            .finish()
    }
}

/// Exchanges app credentials for a tenant token, reusing it until it expires
#[derive(Debug)]
pub struct TokenProvider {
    http: reqwest::Client,
    config: ClientConfig,
    credentials: Credentials,
    cached: Mutex<Option<TokenInfo>>,
}

impl TokenProvider {
    pub fn new(http: reqwest::Client, config: ClientConfig, credentials: Credentials) -> Self {
        Self {
            http,
            config,
            credentials,
            cached: Mutex::new(None),
        }
    }

    /// A valid bearer token, fetching a new one when none is cached or it expired
    pub async fn token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.access_token.clone());
            }
            log::debug!("Tenant token expired, refreshing");
        }

        let token = self.fetch().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn fetch(&self) -> Result<TokenInfo> {
        let url = self.config.url(TOKEN_PATH);
        log::debug!("Requesting tenant token for app {}", self.credentials.app_id);

        let response = self
            .http
            .post(&url)
            .timeout(self.config.timeouts.token)
            .json(&TenantTokenRequest {
                app_id: &self.credentials.app_id,
                app_secret: &self.credentials.app_secret,
            })
            .send()
            .await
            .context("Failed to send token request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Token request failed with HTTP {}: {}", status, body);
        }

        let body: TenantTokenResponse = response
            .json()
            .await
            .context("Failed to parse token response")?;
        if body.code != 0 {
            bail!("Token request failed: code {}, msg: {}", body.code, body.msg);
        }
        let Some(access_token) = body.tenant_access_token else {
            bail!("Token response carried no tenant_access_token");
        };

        let token = TokenInfo::new(access_token, body.expire);
        log::info!("Obtained tenant access token {}", token.preview());
        Ok(token)
    }
}
