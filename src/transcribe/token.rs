//! Short-lived credential for the streaming connection.

use crate::defaults;
use crate::error::{Result, VivaError};
use serde::Deserialize;

/// Token issued by the backend's realtime-token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeToken {
    pub token: String,
    /// Expiry timestamp when the backend reports one.
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Fetch a streaming token from `GET {token_url}`.
///
/// The token is requested with a [`defaults::TOKEN_TTL_SECS`] lifetime; a
/// session outliving it keeps its already-open socket, so no refresh loop
/// is needed.
pub async fn fetch_realtime_token(client: &reqwest::Client, token_url: &str) -> Result<RealtimeToken> {
    let response = client
        .get(token_url)
        .query(&[("expires_in_seconds", defaults::TOKEN_TTL_SECS)])
        .send()
        .await
        .map_err(|e| VivaError::TokenEndpoint {
            message: e.to_string(),
        })?;

    if !response.status().is_success() {
        return Err(VivaError::TokenEndpoint {
            message: format!("HTTP {}", response.status().as_u16()),
        });
    }

    let token: RealtimeToken = response.json().await.map_err(|e| VivaError::TokenEndpoint {
        message: format!("invalid token response: {}", e),
    })?;

    if token.token.is_empty() {
        return Err(VivaError::TokenEndpoint {
            message: "backend returned an empty token".to_string(),
        });
    }

    Ok(token)
}
