use std::env;

/// Process-wide configuration, read from the environment exactly once at
/// startup and passed by reference after that. Missing document or
/// spreadsheet identifiers are represented as `None` so each call can fail
/// with a descriptive configuration error instead of the process refusing
/// to boot.
#[derive(Clone, Debug, Default)]
pub struct Config {
    pub document_id: Option<String>,
    pub spreadsheet_id: Option<String>,
    pub prompt_tab: String,
    pub competitor_tab: String,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            document_id: non_empty(env::var("DOCS_DOCUMENT_ID")),
            spreadsheet_id: non_empty(env::var("SHEETS_SPREADSHEET_ID")),
            prompt_tab: env::var("PROMPT_TAB").unwrap_or_else(|_| "Prompts".to_string()),
            competitor_tab: env::var("COMPETITOR_TAB")
                .unwrap_or_else(|_| "Competitors".to_string()),
            google_client_id: non_empty(env::var("GOOGLE_CLIENT_ID")),
            google_client_secret: non_empty(env::var("GOOGLE_CLIENT_SECRET")),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(8080),
        }
    }
}

fn non_empty(var: Result<String, env::VarError>) -> Option<String> {
    var.ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::non_empty;
    use std::env::VarError;

    #[test]
    fn non_empty_filters_blank_values() {
        assert_eq!(non_empty(Ok("  ".to_string())), None);
        assert_eq!(non_empty(Err(VarError::NotPresent)), None);
        assert_eq!(
            non_empty(Ok(" doc-id ".to_string())),
            Some("doc-id".to_string())
        );
    }
}
