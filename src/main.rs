use anyhow::Result;
use async_openai::{config::OpenAIConfig, Client as OpenAIClient};
use ollama_rs::Ollama;
use std::env;
use tracing::info;

use copyforge::api;
use copyforge::config::Config;
use copyforge::logging::configure_logging;
use copyforge::{AppState, LLMClient};

#[tokio::main]
async fn main() -> Result<()> {
    configure_logging();

    let config = Config::from_env();

    let llm_client = match env::var("LLM_TYPE")
        .unwrap_or_else(|_| "openai".to_string())
        .as_str()
    {
        "ollama" => {
            let host = env::var("OLLAMA_HOST").unwrap_or_else(|_| "localhost".to_string());
            let port: u16 = env::var("OLLAMA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(11434);
            info!("Connecting to Ollama at {}:{}", host, port);
            LLMClient::Ollama(Ollama::new(host, port))
        }
        _ => {
            let api_key = env::var("OPENAI_API_KEY").unwrap_or_default();
            LLMClient::OpenAI(OpenAIClient::with_config(
                OpenAIConfig::new().with_api_key(api_key),
            ))
        }
    };
    let model = env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

    let state = AppState {
        config,
        http: reqwest::Client::new(),
        llm_client,
        model,
    };

    api::serve(state).await
}
