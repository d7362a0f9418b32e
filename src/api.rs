use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use axum_extra::extract::TypedHeader;
use axum_extra::headers::{authorization::Bearer, Authorization};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::auth::{self, TokenBundle};
use crate::classifier::{self, ClassificationResult};
use crate::competitors::{self, CompetitorResult};
use crate::error::AppError;
use crate::fields::{FieldId, Flow, PICTURE_FIELDS};
use crate::generator::{self, pictures, GenerationInput};
use crate::prompt;
use crate::AppState;

pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let port = state.config.port;
    let app = router(state);
    let addr = format!("0.0.0.0:{port}");

    let listener = TcpListener::bind(&addr).await?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/status", post(status_check))
        .route("/classify", post(classify))
        .route("/competitors", post(competitors_lookup))
        .route("/generate/pictures", post(generate_pictures))
        .route("/generate/all", post(generate_all))
        .route("/generate/{field_id}", post(generate_field))
        .with_state(Arc::new(state))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeywordRequest {
    #[serde(default)]
    keyword: String,
    #[serde(flatten)]
    tokens: TokenBundle,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(default)]
    keyword: String,
    flow: Option<Flow>,
    #[serde(default)]
    competitor_urls: Vec<String>,
    #[serde(default)]
    subtopics: Vec<String>,
    #[serde(default)]
    previous_pictures: BTreeMap<FieldId, String>,
    #[serde(flatten)]
    tokens: TokenBundle,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    ok: bool,
    output: String,
    field_id: FieldId,
    flow: Flow,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PicturesResponse {
    ok: bool,
    outputs: BTreeMap<FieldId, String>,
    total_combinations: usize,
    selected_indices: Vec<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateAllResponse {
    results: BTreeMap<FieldId, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<BTreeMap<FieldId, String>>,
    flow: Flow,
    field_count: usize,
    success_count: usize,
}

fn require_keyword(keyword: &str) -> Result<&str, AppError> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Err(AppError::Validation("keyword must not be empty".to_string()));
    }
    Ok(keyword)
}

fn require_token(tokens: &TokenBundle) -> Result<(), AppError> {
    if tokens.access_token.trim().is_empty() {
        return Err(AppError::Auth("missing access token".to_string()));
    }
    Ok(())
}

fn require_flow(flow: Option<Flow>) -> Result<Flow, AppError> {
    flow.ok_or_else(|| AppError::Validation("flow must be provided".to_string()))
}

/// Liveness check. A bearer token is accepted but not required.
async fn status_check(
    auth_header: Option<TypedHeader<Authorization<Bearer>>>,
) -> &'static str {
    if let Some(TypedHeader(header)) = auth_header {
        debug!("status check with bearer token ({} chars)", header.token().len());
    }
    "OK"
}

async fn classify(
    State(state): State<Arc<AppState>>,
    Json(request): Json<KeywordRequest>,
) -> Result<Json<ClassificationResult>, AppError> {
    let keyword = require_keyword(&request.keyword)?;
    require_token(&request.tokens)?;

    let token = auth::effective_token(&state.http, &state.config, &request.tokens).await;
    let result = classifier::classify(&state.http, &state.config, keyword, &token).await?;
    Ok(Json(result))
}

async fn competitors_lookup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<KeywordRequest>,
) -> Result<Json<CompetitorResult>, AppError> {
    let keyword = require_keyword(&request.keyword)?;
    require_token(&request.tokens)?;

    let token = auth::effective_token(&state.http, &state.config, &request.tokens).await;
    let result = competitors::lookup(&state.http, &state.config, keyword, &token).await?;
    Ok(Json(result))
}

async fn generate_field(
    State(state): State<Arc<AppState>>,
    Path(field_id): Path<String>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let field_id: FieldId = field_id
        .parse()
        .map_err(AppError::Validation)?;
    let keyword = require_keyword(&request.keyword)?;
    let flow = require_flow(request.flow)?;
    require_token(&request.tokens)?;

    let token = auth::effective_token(&state.http, &state.config, &request.tokens).await;
    let input = GenerationInput {
        field_id,
        keyword,
        competitor_urls: &request.competitor_urls,
        subtopics: &request.subtopics,
        previous_pictures: &request.previous_pictures,
    };
    let output = generator::generate_field(&state, input, &token).await?;

    Ok(Json(GenerateResponse {
        ok: true,
        output,
        field_id,
        flow,
    }))
}

async fn generate_pictures(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<PicturesResponse>, AppError> {
    let keyword = require_keyword(&request.keyword)?;
    require_flow(request.flow)?;
    require_token(&request.tokens)?;

    let token = auth::effective_token(&state.http, &state.config, &request.tokens).await;
    let batch = pictures::generate_all_pictures(&state, keyword, &token).await?;

    Ok(Json(PicturesResponse {
        ok: true,
        outputs: batch.outputs,
        total_combinations: batch.total_combinations,
        selected_indices: batch.selected_indices,
    }))
}

/// Sequential per-field fan-out over the flow's field list. The four picture
/// fields are produced by one combined batch call, never field by field.
async fn generate_all(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateAllResponse>, AppError> {
    let keyword = require_keyword(&request.keyword)?;
    let flow = require_flow(request.flow)?;
    require_token(&request.tokens)?;

    let token = auth::effective_token(&state.http, &state.config, &request.tokens).await;

    // One whole-tab load feeds every field in the loop.
    let rows = crate::sheets::fetch_values(
        &state.http,
        &state.config,
        &token,
        &state.config.prompt_tab,
        "A1:C",
    )
    .await?;
    let prompt_map: BTreeMap<FieldId, prompt::PromptData> = prompt::prompts_from_sheet(&rows, flow)
        .into_iter()
        .map(|data| (data.field_id, data))
        .collect();

    let mut results: BTreeMap<FieldId, String> = BTreeMap::new();
    let mut errors: BTreeMap<FieldId, String> = BTreeMap::new();
    let empty_pictures = BTreeMap::new();

    for &field_id in flow.fields() {
        if field_id.is_picture() {
            continue; // handled as one batch below
        }

        let Some(data) = prompt_map.get(&field_id) else {
            errors.insert(field_id, format!("no prompt found for \"{field_id}\""));
            continue;
        };

        let input = GenerationInput {
            field_id,
            keyword,
            competitor_urls: &request.competitor_urls,
            subtopics: &request.subtopics,
            previous_pictures: &empty_pictures,
        };
        match generator::generate_with_prompt(&state, &input, &data.prompt, &data.example).await {
            Ok(output) => {
                results.insert(field_id, output);
            }
            Err(e) => {
                errors.insert(field_id, e.public_message());
            }
        }
    }

    match prompt_map.get(&FieldId::Pic1) {
        Some(data) => {
            match pictures::generate_batch_with_prompt(&state, keyword, &data.prompt, &data.example)
                .await
            {
                Ok(batch) => results.extend(batch.outputs),
                Err(e) => {
                    for pic in PICTURE_FIELDS {
                        errors.insert(pic, e.public_message());
                    }
                }
            }
        }
        None => {
            for pic in PICTURE_FIELDS {
                errors.insert(pic, "no prompt found for \"pictures\"".to_string());
            }
        }
    }

    let field_count = flow.fields().len();
    let success_count = results.len();
    info!(
        "Bulk generation for \"{}\": {}/{} fields succeeded",
        keyword, success_count, field_count
    );

    Ok(Json(GenerateAllResponse {
        results,
        errors: if errors.is_empty() { None } else { Some(errors) },
        flow,
        field_count,
        success_count,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_validation_rejects_blank_input() {
        assert!(require_keyword("  ").is_err());
        assert_eq!(require_keyword(" mattress removal ").unwrap(), "mattress removal");
    }

    #[test]
    fn token_validation_rejects_missing_tokens() {
        let empty = TokenBundle::default();
        assert!(matches!(require_token(&empty), Err(AppError::Auth(_))));

        let present = TokenBundle {
            access_token: "tok".to_string(),
            ..TokenBundle::default()
        };
        assert!(require_token(&present).is_ok());
    }

    #[test]
    fn flow_is_required_for_generation() {
        assert!(matches!(require_flow(None), Err(AppError::Validation(_))));
        assert_eq!(require_flow(Some(Flow::NoSubtopics)).unwrap(), Flow::NoSubtopics);
    }

    #[test]
    fn generate_requests_parse_camel_case_bodies() {
        let body = serde_json::json!({
            "keyword": "mattress removal",
            "flow": "with subtopics",
            "competitorUrls": ["a.com"],
            "previousPictures": { "pic1": "Stress-Free Hauling" },
            "accessToken": "tok",
            "refreshToken": "refresh",
            "expiresAt": 1700000000000i64
        });
        let request: GenerateRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.keyword, "mattress removal");
        assert_eq!(request.flow, Some(Flow::WithSubtopics));
        assert_eq!(request.competitor_urls, vec!["a.com"]);
        assert_eq!(
            request.previous_pictures.get(&FieldId::Pic1).map(String::as_str),
            Some("Stress-Free Hauling")
        );
        assert_eq!(request.tokens.access_token, "tok");
        assert_eq!(request.tokens.refresh_token.as_deref(), Some("refresh"));
    }

    #[test]
    fn unknown_field_ids_map_to_validation_errors() {
        let parsed: Result<FieldId, _> = "banner".parse();
        let err = AppError::Validation(parsed.unwrap_err());
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
