use serde::Deserialize;
use tracing::info;

use crate::config::Config;
use crate::error::AppError;
use crate::TARGET_WEB_REQUEST;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Fetches one tab's cell values, header row included. A tab with no data at
/// all comes back as an empty list.
pub async fn fetch_values(
    http: &reqwest::Client,
    config: &Config,
    token: &str,
    tab: &str,
    columns: &str,
) -> Result<Vec<Vec<String>>, AppError> {
    let spreadsheet_id = config.spreadsheet_id.as_deref().ok_or_else(|| {
        AppError::Configuration("SHEETS_SPREADSHEET_ID is not configured".to_string())
    })?;

    let url = format!("{SHEETS_API}/{spreadsheet_id}/values/{tab}!{columns}");
    info!(target: TARGET_WEB_REQUEST, "Fetching sheet range {}!{}", tab, columns);

    let response = http
        .get(&url)
        .bearer_auth(token)
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("sheet fetch failed: {e}")))?;

    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(AppError::Auth(
            "the spreadsheet store rejected the access token".to_string(),
        ));
    }
    if !status.is_success() {
        return Err(AppError::Upstream(format!(
            "sheet fetch returned status {status}"
        )));
    }

    let range = response
        .json::<ValueRange>()
        .await
        .map_err(|e| AppError::Upstream(format!("sheet body was not valid JSON: {e}")))?;

    Ok(range.values)
}
