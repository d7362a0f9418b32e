use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use ollama_rs::generation::completion::request::GenerationRequest;
use ollama_rs::generation::options::GenerationOptions;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use crate::error::AppError;
use crate::{LLMClient, LLMParams, TARGET_LLM_REQUEST};

const LLM_TIMEOUT: Duration = Duration::from_secs(120);

/// One timeout-guarded generation attempt against whichever backend is
/// configured. There is deliberately no retry loop: a failed model call
/// surfaces to the requester.
pub async fn generate_response(
    system: Option<&str>,
    prompt: &str,
    params: &LLMParams,
) -> Result<String, AppError> {
    debug!(target: TARGET_LLM_REQUEST, "Sending generation request ({} prompt chars)", prompt.len());

    let response = match &params.llm_client {
        LLMClient::Ollama(ollama) => {
            let mut request = GenerationRequest::new(params.model.clone(), prompt.to_string());
            request.system = system.map(|s| s.to_string().into());
            request.options = Some(
                GenerationOptions::default()
                    .temperature(params.temperature)
                    .num_predict(params.max_tokens as i32),
            );

            match timeout(LLM_TIMEOUT, ollama.generate(request)).await {
                Ok(Ok(response)) => response.response,
                Ok(Err(e)) => {
                    return Err(AppError::Upstream(format!("model call failed: {e}")));
                }
                Err(_) => {
                    return Err(AppError::Upstream("model call timed out".to_string()));
                }
            }
        }
        LLMClient::OpenAI(client) => {
            let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();
            if let Some(system) = system {
                messages.push(
                    ChatCompletionRequestSystemMessageArgs::default()
                        .content(system)
                        .build()
                        .map_err(|e| {
                            AppError::Upstream(format!("failed to build model request: {e}"))
                        })?
                        .into(),
                );
            }
            messages.push(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()
                    .map_err(|e| AppError::Upstream(format!("failed to build model request: {e}")))?
                    .into(),
            );

            let request = CreateChatCompletionRequestArgs::default()
                .model(&params.model)
                .temperature(params.temperature)
                .max_tokens(params.max_tokens)
                .messages(messages)
                .build()
                .map_err(|e| AppError::Upstream(format!("failed to build model request: {e}")))?;

            match timeout(LLM_TIMEOUT, client.chat().create(request)).await {
                Ok(Ok(response)) => response
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                    .unwrap_or_default(),
                Ok(Err(e)) => {
                    return Err(AppError::Upstream(format!("model call failed: {e}")));
                }
                Err(_) => {
                    return Err(AppError::Upstream("model call timed out".to_string()));
                }
            }
        }
    };

    if response.trim().is_empty() {
        return Err(AppError::Upstream(
            "model returned an empty response".to_string(),
        ));
    }

    debug!(target: TARGET_LLM_REQUEST, "Received generation response ({} chars)", response.len());
    Ok(response)
}
