use serde::Serialize;

use crate::config::Config;
use crate::error::AppError;
use crate::sheets;

const KEYWORD_COLUMN: usize = 0;
const URL_COLUMN: usize = 1;

/// Result of looking a keyword up in the competitor sheet. URLs keep the
/// sheet's order; uniqueness is not enforced.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorResult {
    pub found: bool,
    pub competitor_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_number: Option<usize>,
}

/// Fetches the competitor tab and finds the keyword's row.
pub async fn lookup(
    http: &reqwest::Client,
    config: &Config,
    keyword: &str,
    token: &str,
) -> Result<CompetitorResult, AppError> {
    let rows = sheets::fetch_values(http, config, token, &config.competitor_tab, "A1:B").await?;
    Ok(find_competitors(&rows, keyword))
}

/// Exact case-insensitive match against the keyword column, header row
/// skipped. The URL column is split on commas.
pub fn find_competitors(rows: &[Vec<String>], keyword: &str) -> CompetitorResult {
    let needle = keyword.trim().to_lowercase();

    for (index, row) in rows.iter().enumerate().skip(1) {
        let Some(cell) = row.get(KEYWORD_COLUMN) else {
            continue;
        };
        if cell.trim().to_lowercase() != needle {
            continue;
        }

        let competitor_urls = row
            .get(URL_COLUMN)
            .map(|cell| {
                cell.split(',')
                    .map(|url| url.trim().to_string())
                    .filter(|url| !url.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        return CompetitorResult {
            found: true,
            competitor_urls,
            matched_keyword: Some(cell.trim().to_string()),
            row_number: Some(index + 1),
        };
    }

    CompetitorResult {
        found: false,
        competitor_urls: Vec::new(),
        matched_keyword: None,
        row_number: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> Vec<Vec<String>> {
        vec![
            vec!["Keyword".to_string(), "Competitor URLs".to_string()],
            vec!["couch removal".to_string(), "x.com".to_string()],
            vec![
                "Mattress Removal".to_string(),
                "a.com, b.com".to_string(),
            ],
        ]
    }

    #[test]
    fn exact_match_splits_the_url_column() {
        let result = find_competitors(&sheet(), "mattress removal");
        assert!(result.found);
        assert_eq!(result.competitor_urls, vec!["a.com", "b.com"]);
        assert_eq!(result.matched_keyword.as_deref(), Some("Mattress Removal"));
        assert_eq!(result.row_number, Some(3));
    }

    #[test]
    fn substring_is_not_enough_for_a_match() {
        let result = find_competitors(&sheet(), "mattress");
        assert!(!result.found);
        assert!(result.competitor_urls.is_empty());
        assert!(result.row_number.is_none());
    }

    #[test]
    fn header_row_is_never_matched() {
        let result = find_competitors(&sheet(), "keyword");
        assert!(!result.found);
    }

    #[test]
    fn missing_url_cell_yields_empty_list() {
        let rows = vec![
            vec!["Keyword".to_string()],
            vec!["shed demolition".to_string()],
        ];
        let result = find_competitors(&rows, "Shed Demolition");
        assert!(result.found);
        assert!(result.competitor_urls.is_empty());
    }
}
