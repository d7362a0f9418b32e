pub mod api;
pub mod auth;
pub mod classifier;
pub mod competitors;
pub mod config;
pub mod docs;
pub mod error;
pub mod fields;
pub mod generator;
pub mod llm;
pub mod logging;
pub mod prompt;
pub mod sheets;

use async_openai::{config::OpenAIConfig, Client as OpenAIClient};
use ollama_rs::Ollama;

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_LLM_REQUEST: &str = "llm_request";

#[derive(Clone, Debug)]
pub enum LLMClient {
    Ollama(Ollama),
    OpenAI(OpenAIClient<OpenAIConfig>),
}

/// Everything one model call needs beyond the prompt text itself.
#[derive(Clone)]
pub struct LLMParams {
    pub llm_client: LLMClient,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Shared state injected into every handler. Configuration is built once at
/// startup; business logic never reads the environment directly.
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub http: reqwest::Client,
    pub llm_client: LLMClient,
    pub model: String,
}
