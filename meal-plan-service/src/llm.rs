use rig::{agent::Agent, client::CompletionClient, completion::Chat, providers::openrouter};
use tracing::info;

use crate::error::ServiceError;

const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Model identifier used for generation, overridable via `LLM_MODEL`.
pub fn model_name() -> String {
    std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string())
}

pub fn llm_agent(preamble: &str) -> anyhow::Result<Agent<openrouter::CompletionModel>> {
    let api_key = std::env::var("OPENROUTER_API_KEY")
        .map_err(|_| anyhow::anyhow!("OPENROUTER_API_KEY not set"))?;
    let client = openrouter::Client::new(&api_key);
    let agent = client.agent(&model_name()).preamble(preamble).build();
    Ok(agent)
}

/// One-shot completion returning the raw text handed to the extractor.
/// No retry here; extraction failure is handled downstream by the
/// strategy fallback, not by re-invoking the model.
pub async fn generate(preamble: &str, prompt: &str) -> Result<String, ServiceError> {
    let agent =
        llm_agent(preamble).map_err(|e| ServiceError::LlmUnavailable(e.to_string()))?;

    let response = agent
        .chat(prompt, vec![])
        .await
        .map_err(|e| ServiceError::LlmRequest(e.to_string()))?;

    info!(
        model = %model_name(),
        response_length = response.len(),
        "received completion"
    );
    Ok(response)
}
