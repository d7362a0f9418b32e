use serde_json::Value;
use tracing::info;

use crate::config::Config;
use crate::error::AppError;
use crate::TARGET_WEB_REQUEST;

const DOCS_API: &str = "https://docs.googleapis.com/v1/documents";

/// Fetches the structured document used for keyword classification.
pub async fn fetch_document(
    http: &reqwest::Client,
    config: &Config,
    token: &str,
) -> Result<Value, AppError> {
    let document_id = config.document_id.as_deref().ok_or_else(|| {
        AppError::Configuration("DOCS_DOCUMENT_ID is not configured".to_string())
    })?;

    let url = format!("{DOCS_API}/{document_id}");
    info!(target: TARGET_WEB_REQUEST, "Fetching document {}", document_id);

    let response = http
        .get(&url)
        .bearer_auth(token)
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("document fetch failed: {e}")))?;

    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(AppError::Auth(
            "the document store rejected the access token".to_string(),
        ));
    }
    if !status.is_success() {
        return Err(AppError::Upstream(format!(
            "document fetch returned status {status}"
        )));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| AppError::Upstream(format!("document body was not valid JSON: {e}")))
}
