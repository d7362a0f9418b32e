pub mod parse;
pub mod pictures;

use std::collections::BTreeMap;
use tracing::info;

use crate::error::AppError;
use crate::fields::FieldId;
use crate::llm;
use crate::prompt::{
    first_line, render_subtopics, strip_markdown, substitute_keyword, substitute_subtopics,
    system_instruction, theme_hits, title_case,
};
use crate::{AppState, LLMParams};

const FIELD_TEMPERATURE: f32 = 0.7;
const FIELD_MAX_TOKENS: u32 = 1000;

/// Everything a single-field generation needs besides the prompt template.
pub struct GenerationInput<'a> {
    pub field_id: FieldId,
    pub keyword: &'a str,
    pub competitor_urls: &'a [String],
    pub subtopics: &'a [String],
    /// Previously generated picture captions, keyed by their field. Only
    /// consulted when generating another picture field.
    pub previous_pictures: &'a BTreeMap<FieldId, String>,
}

/// Resolves the field's prompt and generates its content. Absence of a
/// prompt is a hard failure; no default prompt is ever synthesized.
pub async fn generate_field(
    state: &AppState,
    input: GenerationInput<'_>,
    token: &str,
) -> Result<String, AppError> {
    let resolved = crate::prompt::resolve(&state.http, &state.config, input.field_id, token).await?;
    if !resolved.found {
        let message = resolved
            .error
            .unwrap_or_else(|| format!("no prompt found for \"{}\"", input.field_id));
        return Err(AppError::NotFound(message));
    }
    generate_with_prompt(state, &input, &resolved.prompt, &resolved.example).await
}

/// Generation with an already-resolved prompt template, used by the bulk
/// handler after a single whole-tab load.
pub async fn generate_with_prompt(
    state: &AppState,
    input: &GenerationInput<'_>,
    prompt: &str,
    example: &str,
) -> Result<String, AppError> {
    let user_prompt = build_field_prompt(input, prompt, example);
    let system = system_instruction(input.keyword, input.field_id.is_picture());

    let params = LLMParams {
        llm_client: state.llm_client.clone(),
        model: state.model.clone(),
        temperature: FIELD_TEMPERATURE,
        max_tokens: FIELD_MAX_TOKENS,
    };

    info!("Generating \"{}\" for \"{}\"", input.field_id, input.keyword);
    let raw = llm::generate_response(Some(&system), &user_prompt, &params).await?;
    Ok(post_process(input.field_id, input.keyword, &raw))
}

/// Assembles the final user prompt: keyword substitution, subtopic list,
/// example text, FAQ-only competitor references, and the picture-sibling
/// uniqueness block.
pub fn build_field_prompt(input: &GenerationInput<'_>, prompt: &str, example: &str) -> String {
    let mut assembled = substitute_keyword(prompt, input.keyword);
    let example = substitute_keyword(example, input.keyword);

    if input.field_id == FieldId::Subtopics && !input.subtopics.is_empty() {
        let rendered = render_subtopics(input.subtopics);
        match substitute_subtopics(&assembled, &rendered) {
            Some(substituted) => assembled = substituted,
            None => {
                assembled.push_str(&format!(
                    "\n\nCover these subtopics:\n{rendered}\nWrite one short section for each subtopic, in the order given."
                ));
            }
        }
    }

    if !example.trim().is_empty() {
        assembled.push_str(&format!("\n\nExample format:\n{example}"));
    }

    if input.field_id == FieldId::Faq && !input.competitor_urls.is_empty() {
        assembled.push_str(
            "\n\nFor inspiration, not copying, here are competitor pages on the same topic:",
        );
        for url in input.competitor_urls {
            assembled.push_str(&format!("\n- {url}"));
        }
    }

    if input.field_id.is_picture() && !input.previous_pictures.is_empty() {
        assembled.push_str(&uniqueness_block(input.previous_pictures));
    }

    assembled
}

/// Explicit avoid-list built from sibling picture captions: their first
/// lines as used phrases, their theme-vocabulary hits, and the full text for
/// context.
fn uniqueness_block(siblings: &BTreeMap<FieldId, String>) -> String {
    let mut used_phrases = Vec::new();
    let mut used_themes = Vec::new();

    for text in siblings.values() {
        let phrase = first_line(text);
        if !phrase.is_empty() {
            used_phrases.push(format!("\"{phrase}\""));
        }
        for theme in theme_hits(text) {
            if !used_themes.contains(&theme) {
                used_themes.push(theme);
            }
        }
    }

    let mut block = String::from(
        "\n\nUniqueness constraints: this caption must not overlap semantically with the captions already generated.",
    );
    if !used_phrases.is_empty() {
        block.push_str(&format!(
            "\nPhrases already used, avoid them: {}.",
            used_phrases.join(", ")
        ));
    }
    if !used_themes.is_empty() {
        block.push_str(&format!(
            "\nThemes already covered, avoid them: {}.",
            used_themes.join(", ")
        ));
    }
    block.push_str("\nFull captions so far, for context:");
    for (field_id, text) in siblings {
        block.push_str(&format!("\n[{field_id}]\n{text}"));
    }
    block
}

/// Post-processing applied to every generated field: markdown stripped,
/// leftover placeholders re-substituted, titles title-cased.
pub fn post_process(field_id: FieldId, keyword: &str, raw: &str) -> String {
    let text = strip_markdown(raw);
    let text = substitute_keyword(&text, keyword);
    let text = text.trim().to_string();
    if field_id == FieldId::Title {
        title_case(&text)
    } else {
        text
    }
}
