use log::{debug, error};
use reqwest::{blocking::Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::config::{OpenAiConfig, MAX_OUTPUT_TOKENS, TEMPERATURE};
use super::CompletionClient;
use crate::error::{Result, SurveyError};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// Blocking OpenAI chat-completions client.
pub struct OpenAiClient {
    http: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| SurveyError::Config(format!("client build failure: {}", err)))?;

        Ok(Self { http, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

impl CompletionClient for OpenAiClient {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let payload = ChatCompletionRequest {
            model: self.config.model.as_str(),
            messages,
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
        };

        debug!("Requesting completion from {}", self.config.model);
        let response = self
            .http
            .post(self.config.chat_url())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = match serde_json::from_str::<OpenAiErrorResponse>(&body) {
                Ok(parsed) => format!(
                    "{} (type: {}, code: {:?})",
                    parsed.error.message, parsed.error.error_type, parsed.error.code
                ),
                Err(_) => format!("HTTP {} from OpenAI: {}", status, body.trim()),
            };
            error!("Completion request failed: {}", message);
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(SurveyError::Generation(format!("rate limited: {}", message)));
            }
            return Err(SurveyError::Generation(message));
        }

        let completion: ChatCompletionResponse = response.json()?;
        extract_content(completion)
    }
}

fn extract_content(completion: ChatCompletionResponse) -> Result<String> {
    completion
        .choices
        .into_iter()
        .filter_map(|choice| choice.message.content)
        .map(|text| text.trim().to_string())
        .find(|text| !text.is_empty())
        .ok_or_else(|| SurveyError::Generation("OpenAI returned an empty completion".to_string()))
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: String,
    code: Option<String>,
}
