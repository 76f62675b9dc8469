//! Bot Framework transport: bearer-token check on inbound webhooks and reply delivery via the
//! connector API (`POST {serviceUrl}/v3/conversations/{id}/activities/{replyToId}`).
//!
//! Only the token's audience and expiry claims are checked here; signature validation against
//! the platform's OpenID keys belongs to the hosting environment. Because inbound claims are
//! not verified, the connector token is only ever sent to allowlisted `serviceUrl` hosts.

use crate::activity::Activity;
use crate::channels::transport::{ActivityTransport, TransportError};
use crate::config::BotConfig;
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;

const TOKEN_URL: &str = "https://login.microsoftonline.com/botframework.com/oauth2/v2.0/token";
const TOKEN_SCOPE: &str = "https://api.botframework.com/.default";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenClaims {
    #[serde(default)]
    aud: Option<String>,
    #[serde(default)]
    exp: Option<u64>,
}

/// Transport for Bot Framework channels (Teams, Web Chat, Emulator).
///
/// With an empty app id the bot runs in local mode: inbound requests are not authenticated
/// and replies are posted without a connector token.
pub struct BotFrameworkTransport {
    app_id: String,
    app_password: String,
    trusted_hosts: Vec<String>,
    token_url: String,
    client: reqwest::Client,
}

impl BotFrameworkTransport {
    pub fn new(bot: &BotConfig) -> Self {
        Self {
            app_id: bot.app_id.trim().to_string(),
            app_password: bot.app_password.clone(),
            trusted_hosts: bot
                .trusted_service_hosts
                .iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
            token_url: TOKEN_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the OAuth token endpoint (for tests or sovereign clouds).
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    fn local_mode(&self) -> bool {
        self.app_id.is_empty()
    }

    /// Reject connector URLs whose host is not on the allowlist.
    fn ensure_trusted(&self, url: &reqwest::Url) -> Result<(), TransportError> {
        let host = url.host_str().unwrap_or("").to_ascii_lowercase();
        if self.trusted_hosts.iter().any(|p| host_matches(p, &host)) {
            Ok(())
        } else {
            Err(TransportError::UntrustedServiceUrl(host))
        }
    }

    /// Client-credentials grant for a connector access token.
    async fn fetch_token(&self) -> Result<String, TransportError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.app_id.as_str()),
            ("client_secret", self.app_password.as_str()),
            ("scope", TOKEN_SCOPE),
        ];
        let res = self.client.post(&self.token_url).form(&form).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(TransportError::Api(format!(
                "token request failed: {} {}",
                status, body
            )));
        }
        let data: TokenResponse = res.json().await?;
        Ok(data.access_token)
    }
}

/// `*.example.com` matches subdomains of example.com; anything else must match exactly.
fn host_matches(pattern: &str, host: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(domain) => host
            .strip_suffix(domain)
            .map(|rest| rest.len() > 1 && rest.ends_with('.'))
            .unwrap_or(false),
        None => pattern == host,
    }
}

/// Connector URL for a reply: threaded under the inbound activity id when there is one.
fn activities_url(inbound: &Activity) -> Result<reqwest::Url, TransportError> {
    let service_url = inbound
        .service_url
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or(TransportError::MissingServiceUrl)?;
    let mut url =
        reqwest::Url::parse(service_url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| TransportError::InvalidUrl(service_url.to_string()))?;
        segments
            .pop_if_empty()
            .extend(["v3", "conversations", inbound.conversation.id.as_str(), "activities"]);
        if let Some(id) = inbound.id.as_deref().filter(|s| !s.is_empty()) {
            segments.push(id);
        }
    }
    Ok(url)
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Decode the (unverified) claims segment of a JWT.
fn token_claims(token: &str) -> Result<TokenClaims, TransportError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| TransportError::Unauthorized("malformed bearer token".to_string()))?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| TransportError::Unauthorized("malformed bearer token".to_string()))?;
    serde_json::from_slice(&bytes)
        .map_err(|_| TransportError::Unauthorized("malformed bearer token claims".to_string()))
}

#[async_trait]
impl ActivityTransport for BotFrameworkTransport {
    fn authenticate(&self, auth_header: &str) -> Result<(), TransportError> {
        if self.local_mode() {
            return Ok(());
        }
        let token = auth_header
            .trim()
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| TransportError::Unauthorized("missing bearer token".to_string()))?;
        let claims = token_claims(token)?;
        if claims.aud.as_deref() != Some(self.app_id.as_str()) {
            return Err(TransportError::Unauthorized(
                "token audience does not match app id".to_string(),
            ));
        }
        if let Some(exp) = claims.exp {
            if exp <= now_secs() {
                return Err(TransportError::Unauthorized("token expired".to_string()));
            }
        }
        Ok(())
    }

    async fn connector_token(&self, inbound: &Activity) -> Result<Option<String>, TransportError> {
        if self.local_mode() {
            return Ok(None);
        }
        self.ensure_trusted(&activities_url(inbound)?)?;
        Ok(Some(self.fetch_token().await?))
    }

    async fn send(
        &self,
        inbound: &Activity,
        outbound: &Activity,
        token: Option<&str>,
    ) -> Result<(), TransportError> {
        let url = activities_url(inbound)?;
        if token.is_some() || !self.local_mode() {
            self.ensure_trusted(&url)?;
        }
        let mut req = self.client.post(url).json(outbound);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        let res = req.send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(TransportError::Api(format!(
                "send activity failed: {} {}",
                status, body
            )));
        }
        log::debug!(
            "delivered {:?} activity to conversation {}",
            outbound.typ,
            inbound.conversation.id
        );
        Ok(())
    }
}
