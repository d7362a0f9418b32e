use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::TARGET_WEB_REQUEST;

const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Bearer-token material carried on every request body. Only `accessToken`
/// is required; the refresh fields are optional hints.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBundle {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Expiry as milliseconds since the epoch.
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl TokenBundle {
    pub fn is_stale(&self) -> bool {
        self.expires_at
            .map(|at| at <= Utc::now().timestamp_millis())
            .unwrap_or(false)
    }
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
}

/// The token to use for upstream calls: the refreshed one when a stale
/// bundle could be exchanged, otherwise the original. The refresh branch is
/// explicit so this fallback is visible at the call site.
pub async fn effective_token(http: &reqwest::Client, config: &Config, bundle: &TokenBundle) -> String {
    match refresh_access_token(http, config, bundle).await {
        Some(refreshed) => refreshed,
        None => bundle.access_token.clone(),
    }
}

/// One refresh-token exchange, attempted only when the bundle carries a
/// stale expiry and a refresh token. `None` means keep the token you have;
/// a failed exchange never fails the request.
pub async fn refresh_access_token(
    http: &reqwest::Client,
    config: &Config,
    bundle: &TokenBundle,
) -> Option<String> {
    if !bundle.is_stale() {
        return None;
    }
    let refresh_token = bundle.refresh_token.as_deref()?;

    let (client_id, client_secret) = match (&config.google_client_id, &config.google_client_secret)
    {
        (Some(id), Some(secret)) => (id.as_str(), secret.as_str()),
        _ => {
            debug!(target: TARGET_WEB_REQUEST, "OAuth client credentials not configured, skipping token refresh");
            return None;
        }
    };

    let form = [
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
    ];

    match http.post(TOKEN_ENDPOINT).form(&form).send().await {
        Ok(response) if response.status().is_success() => {
            match response.json::<RefreshResponse>().await {
                Ok(body) => {
                    debug!(target: TARGET_WEB_REQUEST, "Access token refreshed");
                    Some(body.access_token)
                }
                Err(e) => {
                    warn!(target: TARGET_WEB_REQUEST, "Token refresh body unreadable: {}", e);
                    None
                }
            }
        }
        Ok(response) => {
            warn!(target: TARGET_WEB_REQUEST, "Token refresh returned status {}", response.status());
            None
        }
        Err(e) => {
            warn!(target: TARGET_WEB_REQUEST, "Token refresh request failed: {}", e);
            None
        }
    }
}
