use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use etlsmith_core::{Catalog, FlowDefinition};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::error::{PlannerError, PlannerResult};
use crate::prompt::system_prompt;
use crate::FlowPlanner;

/// Configuration for an OpenAI-compatible chat completions endpoint
#[derive(Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    /// Timeout in seconds for HTTP requests
    pub timeout_secs: u64,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.1,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
    response_format: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Planner backed by a chat completions API
#[derive(Debug, Clone)]
pub struct LlmPlanner {
    config: LlmConfig,
    client: Client,
    system_prompt: Arc<str>,
}

impl LlmPlanner {
    /// Creates a planner whose prompt advertises the entries of `catalog`
    pub fn new(config: LlmConfig, catalog: &Catalog) -> PlannerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PlannerError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            system_prompt: Arc::from(system_prompt(catalog)),
        })
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn map_http_error(error: reqwest::Error) -> PlannerError {
        if error.is_timeout() {
            PlannerError::Transport(format!("Request timeout: {}", error))
        } else if error.is_connect() {
            PlannerError::Transport(format!("Connection error: {}", error))
        } else {
            PlannerError::Transport(format!("HTTP error: {}", error))
        }
    }
}

#[async_trait]
impl FlowPlanner for LlmPlanner {
    #[instrument(skip(self, description), fields(model = %self.config.model))]
    async fn plan(&self, description: &str) -> PlannerResult<FlowDefinition> {
        let description = description.trim();
        if description.is_empty() {
            return Err(PlannerError::EmptyDescription);
        }
        let api_key = self.config.api_key.as_deref().ok_or(PlannerError::MissingApiKey)?;

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let request = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: description,
                },
            ],
            response_format: json!({"type": "json_object"}),
        };

        debug!("Requesting flow plan");
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(Self::map_http_error)?;

        let response: ChatResponse = match response.status() {
            StatusCode::OK => response
                .json()
                .await
                .map_err(|e| PlannerError::Decode(e.to_string()))?,
            status => {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| format!("HTTP error: {}", status));
                return Err(PlannerError::Api {
                    status: status.as_u16(),
                    body,
                });
            }
        };

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(PlannerError::EmptyResponse)?;

        let definition = FlowDefinition::from_json(&content)?;
        info!(
            processors = definition.processors.len(),
            connections = definition.connections.len(),
            services = definition.services().len(),
            "Received flow plan"
        );
        Ok(definition)
    }
}
