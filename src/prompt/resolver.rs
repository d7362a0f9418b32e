use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::config::Config;
use crate::error::AppError;
use crate::fields::{FieldId, Flow, PICTURE_FIELDS};
use crate::sheets;

const TITLE_COLUMN: usize = 0;
const PROMPT_COLUMN: usize = 1;
const EXAMPLE_COLUMN: usize = 2;

/// 1-based sheet row (header included) whose prompt fans out into all four
/// picture fields.
const PICTURES_ROW: usize = 13;
/// 1-based sheet row restricted to the subtopics field of the
/// "with subtopics" flow.
const SUBTOPICS_ROW: usize = 17;

/// One resolved prompt row after fan-out and dedup.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptData {
    pub field_id: FieldId,
    pub field_title: String,
    pub prompt: String,
    pub example: String,
    /// Set for entries sourced from the subtopics sentinel row, which only
    /// the "with subtopics" flow may use.
    pub subtopics_only: bool,
}

/// Outcome of a single-field prompt lookup.
#[derive(Clone, Debug, Serialize)]
pub struct PromptResult {
    pub found: bool,
    pub prompt: String,
    pub example: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PromptResult {
    fn not_found(error: String) -> Self {
        PromptResult {
            found: false,
            prompt: String::new(),
            example: String::new(),
            error: Some(error),
        }
    }
}

/// Fetches the prompt tab and resolves one field's prompt. An unset
/// spreadsheet id comes back as `found=false` with the configuration message
/// in `error`, so the caller decides whether that is fatal.
pub async fn resolve(
    http: &reqwest::Client,
    config: &Config,
    field_id: FieldId,
    token: &str,
) -> Result<PromptResult, AppError> {
    let rows = match sheets::fetch_values(http, config, token, &config.prompt_tab, "A1:C").await {
        Ok(rows) => rows,
        Err(AppError::Configuration(message)) => {
            return Ok(PromptResult::not_found(message));
        }
        Err(e) => return Err(e),
    };
    Ok(resolve_prompt(&rows, field_id))
}

/// Case-insensitive exact match of the field's sheet name against the key
/// column, header row skipped. A matching row with an empty prompt cell gets
/// its own error message.
pub fn resolve_prompt(rows: &[Vec<String>], field_id: FieldId) -> PromptResult {
    let sheet_name = field_id.sheet_name();

    if rows.len() <= 1 {
        return PromptResult::not_found(format!(
            "the prompt sheet has no rows to match \"{sheet_name}\""
        ));
    }

    for row in rows.iter().skip(1) {
        let Some(key) = row.get(TITLE_COLUMN) else {
            continue;
        };
        if !key.trim().eq_ignore_ascii_case(sheet_name) {
            continue;
        }

        let prompt = row.get(PROMPT_COLUMN).map(String::as_str).unwrap_or("");
        if prompt.trim().is_empty() {
            return PromptResult::not_found(format!(
                "the prompt cell for \"{sheet_name}\" is empty"
            ));
        }

        return PromptResult {
            found: true,
            prompt: prompt.to_string(),
            example: row.get(EXAMPLE_COLUMN).cloned().unwrap_or_default(),
            error: None,
        };
    }

    PromptResult::not_found(format!("no prompt row matches \"{sheet_name}\""))
}

/// Loads the whole prompt tab into a set of `PromptData`, honoring the
/// picture fan-out row and the subtopics sentinel row. Titles that map to no
/// field, or to a field that already has a prompt, are dropped silently —
/// logged at debug, never surfaced to the caller.
pub fn prompts_from_sheet(rows: &[Vec<String>], flow: Flow) -> Vec<PromptData> {
    let mut prompts = Vec::new();
    let mut seen: HashSet<FieldId> = HashSet::new();
    let mut pictures_row: Option<(String, String, String)> = None;

    for (index, row) in rows.iter().enumerate().skip(1) {
        let row_number = index + 1;
        let title = row
            .get(TITLE_COLUMN)
            .map(|t| t.trim().to_string())
            .unwrap_or_default();
        let prompt = row
            .get(PROMPT_COLUMN)
            .map(|p| p.to_string())
            .unwrap_or_default();
        let example = row
            .get(EXAMPLE_COLUMN)
            .map(|e| e.to_string())
            .unwrap_or_default();

        if prompt.trim().is_empty() {
            debug!("dropping prompt row {} (\"{}\"): empty prompt", row_number, title);
            continue;
        }

        if row_number == PICTURES_ROW {
            pictures_row = Some((title, prompt, example));
            continue;
        }

        if row_number == SUBTOPICS_ROW {
            if flow != Flow::WithSubtopics {
                debug!(
                    "dropping prompt row {} (\"{}\"): subtopics row outside the subtopics flow",
                    row_number, title
                );
                continue;
            }
            if !seen.insert(FieldId::Subtopics) {
                debug!("dropping prompt row {} (\"{}\"): duplicate subtopics", row_number, title);
                continue;
            }
            prompts.push(PromptData {
                field_id: FieldId::Subtopics,
                field_title: title,
                prompt,
                example,
                subtopics_only: true,
            });
            continue;
        }

        let Some(field_id) = map_title(&title) else {
            debug!("dropping prompt row {} (\"{}\"): unmapped title", row_number, title);
            continue;
        };
        if !seen.insert(field_id) {
            debug!(
                "dropping prompt row {} (\"{}\"): \"{}\" already has a prompt",
                row_number, title, field_id
            );
            continue;
        }

        prompts.push(PromptData {
            field_id,
            field_title: title,
            prompt,
            example,
            subtopics_only: false,
        });
    }

    // Fan the shared pictures prompt out into the four picture fields,
    // skipping any that were individually mapped above.
    if let Some((title, prompt, example)) = pictures_row {
        for pic in PICTURE_FIELDS {
            if !seen.insert(pic) {
                continue;
            }
            prompts.push(PromptData {
                field_id: pic,
                field_title: title.clone(),
                prompt: prompt.clone(),
                example: example.clone(),
                subtopics_only: false,
            });
        }
    }

    prompts
}

/// Resolves a sheet title to a field: exact (case-insensitive) first, then
/// substring fallback.
fn map_title(title: &str) -> Option<FieldId> {
    const MAPPINGS: &[(&str, FieldId)] = &[
        ("title", FieldId::Title),
        ("intro", FieldId::Intro),
        ("introduction", FieldId::Intro),
        ("pic1", FieldId::Pic1),
        ("pic2", FieldId::Pic2),
        ("pic3", FieldId::Pic3),
        ("pic4", FieldId::Pic4),
        ("picture 1", FieldId::Pic1),
        ("picture 2", FieldId::Pic2),
        ("picture 3", FieldId::Pic3),
        ("picture 4", FieldId::Pic4),
        ("subtopics", FieldId::Subtopics),
        ("cost", FieldId::Cost),
        ("why us", FieldId::Why),
        ("why", FieldId::Why),
        ("faq", FieldId::Faq),
    ];

    let needle = title.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    for (name, field_id) in MAPPINGS {
        if needle == *name {
            return Some(*field_id);
        }
    }
    for (name, field_id) in MAPPINGS {
        if needle.contains(name) {
            return Some(*field_id);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(title: &str, prompt: &str, example: &str) -> Vec<String> {
        vec![title.to_string(), prompt.to_string(), example.to_string()]
    }

    /// A prompt tab shaped like the production sheet: header, field rows,
    /// padding up to the sentinel rows at 13 and 17.
    fn sheet() -> Vec<Vec<String>> {
        let mut rows = vec![row("Field", "Prompt", "Example")];
        rows.push(row("title", "Write a title about {{keyword}}", "")); // row 2
        rows.push(row("intro", "Write an intro about KEYWORD", "Example intro")); // row 3
        rows.push(row("cost", "Explain pricing for {{KEYWORD}}", "")); // row 4
        rows.push(row("why", "Why choose us for {{keyword}}", "")); // row 5
        rows.push(row("faq", "Write FAQs about {{keyword}}", "")); // row 6
        for _ in 7..PICTURES_ROW {
            rows.push(row("", "", ""));
        }
        rows.push(row(
            "pictures",
            "Write 13 picture captions for {{keyword}}",
            "Caption: summary",
        )); // row 13
        for _ in PICTURES_ROW + 1..SUBTOPICS_ROW {
            rows.push(row("", "", ""));
        }
        rows.push(row(
            "subtopics",
            "Write a section per subtopic of {{keyword}}",
            "",
        )); // row 17
        rows
    }

    #[test]
    fn resolve_matches_the_key_column_case_insensitively() {
        let rows = vec![
            row("Field", "Prompt", "Example"),
            row("  Cost ", "Explain pricing", "Sample"),
        ];
        let result = resolve_prompt(&rows, FieldId::Cost);
        assert!(result.found);
        assert_eq!(result.prompt, "Explain pricing");
        assert_eq!(result.example, "Sample");
        assert!(result.error.is_none());
    }

    #[test]
    fn missing_row_names_the_field_in_the_error() {
        let rows = vec![row("Field", "Prompt", "Example"), row("title", "x", "")];
        let result = resolve_prompt(&rows, FieldId::Cost);
        assert!(!result.found);
        assert!(result.error.unwrap().contains("cost"));
    }

    #[test]
    fn empty_prompt_cell_gets_a_distinct_error() {
        let rows = vec![row("Field", "Prompt", "Example"), row("cost", "  ", "")];
        let result = resolve_prompt(&rows, FieldId::Cost);
        assert!(!result.found);
        assert!(result.error.unwrap().contains("empty"));
    }

    #[test]
    fn empty_sheet_is_reported() {
        let rows = vec![row("Field", "Prompt", "Example")];
        let result = resolve_prompt(&rows, FieldId::Title);
        assert!(!result.found);
        assert!(result.error.unwrap().contains("no rows"));
    }

    #[test]
    fn picture_fields_resolve_through_the_sentinel_name() {
        let result = resolve_prompt(&sheet(), FieldId::Pic2);
        assert!(result.found);
        assert!(result.prompt.contains("13 picture captions"));
    }

    #[test]
    fn pictures_row_fans_out_into_four_fields() {
        let prompts = prompts_from_sheet(&sheet(), Flow::WithSubtopics);
        for pic in PICTURE_FIELDS {
            let entry = prompts.iter().find(|p| p.field_id == pic).unwrap();
            assert!(entry.prompt.contains("13 picture captions"));
            assert!(!entry.subtopics_only);
        }
    }

    #[test]
    fn individually_mapped_picture_rows_win_over_the_fan_out() {
        let mut rows = sheet();
        rows[2] = row("pic1", "A dedicated pic1 prompt", "");
        let prompts = prompts_from_sheet(&rows, Flow::WithSubtopics);

        let pic1: Vec<_> = prompts
            .iter()
            .filter(|p| p.field_id == FieldId::Pic1)
            .collect();
        assert_eq!(pic1.len(), 1);
        assert_eq!(pic1[0].prompt, "A dedicated pic1 prompt");

        // The other three still come from the fan-out.
        let pic2 = prompts.iter().find(|p| p.field_id == FieldId::Pic2).unwrap();
        assert!(pic2.prompt.contains("13 picture captions"));
    }

    #[test]
    fn subtopics_row_is_restricted_to_the_subtopics_flow() {
        let with = prompts_from_sheet(&sheet(), Flow::WithSubtopics);
        let entry = with
            .iter()
            .find(|p| p.field_id == FieldId::Subtopics)
            .unwrap();
        assert!(entry.subtopics_only);

        let without = prompts_from_sheet(&sheet(), Flow::NoSubtopics);
        assert!(without.iter().all(|p| p.field_id != FieldId::Subtopics));
    }

    #[test]
    fn unmapped_titles_are_dropped_silently() {
        let mut rows = sheet();
        rows.push(row("hero banner", "Some prompt", ""));
        let prompts = prompts_from_sheet(&rows, Flow::WithSubtopics);
        assert!(prompts.iter().all(|p| p.field_title != "hero banner"));
    }

    #[test]
    fn at_most_one_prompt_per_field_after_dedup() {
        let mut rows = sheet();
        rows.push(row("cost", "Second cost prompt", ""));
        let prompts = prompts_from_sheet(&rows, Flow::WithSubtopics);

        let cost: Vec<_> = prompts
            .iter()
            .filter(|p| p.field_id == FieldId::Cost)
            .collect();
        assert_eq!(cost.len(), 1);
        assert!(cost[0].prompt.contains("pricing"));
    }

    #[test]
    fn substring_fallback_maps_decorated_titles() {
        assert_eq!(map_title("Page Title Prompt"), Some(FieldId::Title));
        assert_eq!(map_title("FAQ section"), Some(FieldId::Faq));
        assert_eq!(map_title("hero banner"), None);
        assert_eq!(map_title(""), None);
    }
}
