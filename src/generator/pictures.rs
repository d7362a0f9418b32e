use rand::Rng;
use std::collections::BTreeMap;
use tracing::info;

use crate::error::AppError;
use crate::fields::{FieldId, PICTURE_FIELDS};
use crate::generator::parse::{parse_combinations, PictureCombination, REQUESTED_COMBINATIONS};
use crate::llm;
use crate::prompt::{substitute_keyword, system_instruction, title_case};
use crate::{AppState, LLMParams};

const BATCH_TEMPERATURE: f32 = 0.8;
const BATCH_MAX_TOKENS: u32 = 2000;

/// Result of one combined picture generation: four captions plus the
/// bookkeeping the UI displays.
#[derive(Clone, Debug)]
pub struct PictureBatch {
    pub outputs: BTreeMap<FieldId, String>,
    pub total_combinations: usize,
    pub selected_indices: Vec<usize>,
}

/// Generates all four picture captions from a single model call against the
/// shared `pictures` prompt.
pub async fn generate_all_pictures(
    state: &AppState,
    keyword: &str,
    token: &str,
) -> Result<PictureBatch, AppError> {
    let resolved = crate::prompt::resolve(&state.http, &state.config, FieldId::Pic1, token).await?;
    if !resolved.found {
        let message = resolved
            .error
            .unwrap_or_else(|| "no prompt found for \"pictures\"".to_string());
        return Err(AppError::NotFound(message));
    }
    generate_batch_with_prompt(state, keyword, &resolved.prompt, &resolved.example).await
}

/// Batch generation with an already-resolved prompt, used by the bulk
/// handler.
pub async fn generate_batch_with_prompt(
    state: &AppState,
    keyword: &str,
    prompt: &str,
    example: &str,
) -> Result<PictureBatch, AppError> {
    let mut user_prompt = substitute_keyword(prompt, keyword);
    user_prompt.push_str(&format!(
        "\n\nProduce exactly {REQUESTED_COMBINATIONS} unique title and summary combinations for \"{keyword}\". \
         Number each combination and separate combinations with a blank line. \
         No two combinations may share a title or repeat the same benefit."
    ));
    let example = substitute_keyword(example, keyword);
    if !example.trim().is_empty() {
        user_prompt.push_str(&format!("\n\nExample format:\n{example}"));
    }

    let system = system_instruction(keyword, true);
    let params = LLMParams {
        llm_client: state.llm_client.clone(),
        model: state.model.clone(),
        temperature: BATCH_TEMPERATURE,
        max_tokens: BATCH_MAX_TOKENS,
    };

    info!("Generating picture batch for \"{}\"", keyword);
    let raw = llm::generate_response(Some(&system), &user_prompt, &params).await?;

    let combinations = parse_combinations(&raw);
    let mut rng = rand::rng();
    let selected_indices = select_picture_indices(combinations.len(), &mut rng)?;
    let outputs = assign_pictures(&combinations, &selected_indices);

    Ok(PictureBatch {
        outputs,
        total_combinations: combinations.len(),
        selected_indices,
    })
}

/// Picks four distinct indices uniformly at random, capped to the first
/// thirteen candidates. Fewer than four parsed combinations is a hard error.
pub fn select_picture_indices<R: Rng + ?Sized>(
    count: usize,
    rng: &mut R,
) -> Result<Vec<usize>, AppError> {
    if count < PICTURE_FIELDS.len() {
        return Err(AppError::Upstream(format!(
            "only {count} picture combinations were recovered, need at least {}",
            PICTURE_FIELDS.len()
        )));
    }
    let pool = count.min(REQUESTED_COMBINATIONS);
    Ok(rand::seq::index::sample(rng, pool, PICTURE_FIELDS.len()).into_vec())
}

/// Maps selected combinations onto pic1..pic4, title-casing each title line.
fn assign_pictures(
    combinations: &[PictureCombination],
    indices: &[usize],
) -> BTreeMap<FieldId, String> {
    PICTURE_FIELDS
        .iter()
        .zip(indices)
        .map(|(field_id, &index)| {
            let combination = &combinations[index];
            let title = title_case(&combination.title);
            let content = if combination.summary.is_empty() {
                title
            } else {
                format!("{title}\n{}", combination.summary)
            };
            (*field_id, content)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combos(count: usize) -> Vec<PictureCombination> {
        (0..count)
            .map(|n| PictureCombination {
                title: format!("caption number {n}"),
                summary: format!("Summary {n}."),
            })
            .collect()
    }

    #[test]
    fn selection_returns_four_distinct_indices() {
        let mut rng = rand::rng();
        for count in [4, 7, 13, 20] {
            let indices = select_picture_indices(count, &mut rng).unwrap();
            assert_eq!(indices.len(), 4);
            let mut sorted = indices.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), 4, "indices must be distinct");
            assert!(indices.iter().all(|&i| i < count.min(13)));
        }
    }

    #[test]
    fn selection_fails_below_four_combinations() {
        let mut rng = rand::rng();
        let err = select_picture_indices(3, &mut rng).unwrap_err();
        assert!(err.to_string().contains("3"));
    }

    #[test]
    fn assignment_covers_all_four_picture_fields() {
        let outputs = assign_pictures(&combos(13), &[0, 5, 9, 12]);
        assert_eq!(outputs.len(), 4);
        for field_id in PICTURE_FIELDS {
            assert!(outputs.contains_key(&field_id));
        }
        assert_eq!(outputs[&FieldId::Pic1], "Caption Number 0\nSummary 0.");
        assert_eq!(outputs[&FieldId::Pic4], "Caption Number 12\nSummary 12.");
    }

    #[test]
    fn titles_without_summaries_stand_alone() {
        let combinations = vec![
            PictureCombination {
                title: "quick and tidy".to_string(),
                summary: String::new(),
            },
            PictureCombination {
                title: "b".to_string(),
                summary: "s".to_string(),
            },
            PictureCombination {
                title: "c".to_string(),
                summary: "s".to_string(),
            },
            PictureCombination {
                title: "d".to_string(),
                summary: "s".to_string(),
            },
        ];
        let outputs = assign_pictures(&combinations, &[0, 1, 2, 3]);
        assert_eq!(outputs[&FieldId::Pic1], "Quick and Tidy");
    }
}
