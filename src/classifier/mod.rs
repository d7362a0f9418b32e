mod flatten;

pub use flatten::{flatten_document, DocumentTextElement};

use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::docs;
use crate::error::AppError;
use crate::fields::Flow;

/// Outcome of classifying one keyword against the document. `category` is
/// `None` only when no element contains the keyword; `subtopics` is present
/// only for heading matches with at least one qualifying follower.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub category: Option<Flow>,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtopics: Option<Vec<String>>,
}

/// Fetches the document and classifies the keyword into a flow.
pub async fn classify(
    http: &reqwest::Client,
    config: &Config,
    keyword: &str,
    token: &str,
) -> Result<ClassificationResult, AppError> {
    let doc = docs::fetch_document(http, config, token).await?;
    let elements = flatten_document(&doc);
    let result = classify_elements(&elements, keyword);
    if result.category.is_none() {
        return Err(AppError::NotFound(result.reason));
    }

    info!(
        "Classified \"{}\" as {} ({})",
        keyword.trim(),
        result.category.map(|f| f.as_str()).unwrap_or("none"),
        result.reason
    );
    Ok(result)
}

/// Scans the flattened document for the first element containing the keyword
/// (case-insensitive substring, first match wins) and applies the two-branch
/// classification rule. The loose substring matching is deliberate: "haul"
/// matching "hauling" is the behavior downstream callers depend on.
pub fn classify_elements(elements: &[DocumentTextElement], keyword: &str) -> ClassificationResult {
    let needle = keyword.trim().to_lowercase();

    let matched = elements
        .iter()
        .position(|element| element.text.to_lowercase().contains(&needle));

    let Some(index) = matched else {
        return ClassificationResult {
            category: None,
            reason: format!("no line in the document mentions \"{}\"", keyword.trim()),
            matched_line: None,
            line_number: None,
            subtopics: None,
        };
    };

    let element = &elements[index];

    if element.is_heading {
        // Collect everything up to the next heading as subtopics, skipping
        // lines that are exactly the keyword again.
        let mut subtopics = Vec::new();
        for candidate in &elements[index + 1..] {
            if candidate.is_heading {
                break;
            }
            if candidate.text.trim().to_lowercase() == needle {
                continue;
            }
            subtopics.push(candidate.text.clone());
        }

        return ClassificationResult {
            category: Some(Flow::WithSubtopics),
            reason: format!("keyword matched a level {} heading", element.level),
            matched_line: Some(element.text.clone()),
            line_number: Some(index + 1),
            subtopics: if subtopics.is_empty() {
                None
            } else {
                Some(subtopics)
            },
        };
    }

    let preceding_heading = elements[..index].iter().rev().find(|e| e.is_heading);
    let reason = match preceding_heading {
        Some(heading) => format!(
            "keyword matched body text under the heading \"{}\"",
            heading.text
        ),
        None => "keyword matched body text with no preceding heading".to_string(),
    };

    ClassificationResult {
        category: Some(Flow::NoSubtopics),
        reason,
        matched_line: Some(element.text.clone()),
        line_number: Some(index + 1),
        subtopics: None,
    }
}
