//! Transport trait: authenticate, decode, encode, and send activities for one platform.

use crate::activity::{Activity, Reply};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("invalid activity: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("activity has no serviceUrl")]
    MissingServiceUrl,
    #[error("untrusted serviceUrl host: {0}")]
    UntrustedServiceUrl(String),
    #[error("invalid connector url: {0}")]
    InvalidUrl(String),
    #[error("connector request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("connector api error: {0}")]
    Api(String),
}

/// Platform capability used by the webhook endpoint and the per-turn context.
#[async_trait]
pub trait ActivityTransport: Send + Sync {
    /// Check the raw `Authorization` header ("" when absent).
    fn authenticate(&self, auth_header: &str) -> Result<(), TransportError>;

    /// Decode a webhook body into an activity.
    fn decode(&self, body: &[u8]) -> Result<Activity, TransportError> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Build the outbound activity for `reply` in answer to `inbound`.
    fn encode(&self, inbound: &Activity, reply: &Reply) -> Activity {
        inbound.create_reply(reply)
    }

    /// Credential attached to every send of one turn. Fetched at most once per turn.
    async fn connector_token(&self, _inbound: &Activity) -> Result<Option<String>, TransportError> {
        Ok(None)
    }

    /// Deliver one outbound activity to the conversation `inbound` came from.
    async fn send(
        &self,
        inbound: &Activity,
        outbound: &Activity,
        token: Option<&str>,
    ) -> Result<(), TransportError>;
}
