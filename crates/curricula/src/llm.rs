use crate::config::GeneratorConfig;
use crate::error::Error;
use curricula_core::prompt::Prompt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::future::Future;

const APP_TITLE: &str = "Teacher Curriculum Generator";
const TEMPERATURE: f32 = 0.7;

/// A chat model that turns a prompt into reply text.
pub trait LlmClient: Send + Sync {
    fn complete(
        &self,
        prompt: &Prompt,
        max_tokens: u32,
    ) -> impl Future<Output = Result<String, Error>> + Send;
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: ChoiceMessage,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Text of the first choice; empty when the provider sent none.
    pub fn into_text(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default()
    }
}

pub fn build_request<'a>(model: &'a str, prompt: &'a Prompt, max_tokens: u32) -> ChatCompletionRequest<'a> {
    ChatCompletionRequest {
        model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: &prompt.system,
            },
            ChatMessage {
                role: "user",
                content: &prompt.user,
            },
        ],
        temperature: TEMPERATURE,
        max_tokens,
    }
}

/// OpenRouter chat-completions client.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http: reqwest::Client,
    model: String,
    endpoint: String,
    api_key: Option<String>,
}

impl OpenRouterClient {
    pub fn new(config: &GeneratorConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "http-referer",
            HeaderValue::from_str(&config.site_url)
                .map_err(|e| Error::Generic(format!("Invalid site URL: {e}")))?,
        );
        headers.insert("x-title", HeaderValue::from_static(APP_TITLE));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Generic(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            model: config.model.clone(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
        })
    }
}

impl LlmClient for OpenRouterClient {
    async fn complete(&self, prompt: &Prompt, max_tokens: u32) -> Result<String, Error> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::ExternalCall("OPEN_ROUTER_API_KEY is not set".to_string()))?;

        log::debug!(
            "POST {} model={} max_tokens={}",
            self.endpoint,
            self.model,
            max_tokens
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {api_key}"))
            .json(&build_request(&self.model, prompt, max_tokens))
            .send()
            .await
            .map_err(|e| Error::ExternalCall(format!("Failed to reach OpenRouter: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ExternalCall(format!(
                "OpenRouter returned {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::ExternalCall(format!("Failed to decode OpenRouter response: {e}")))?;

        Ok(completion.into_text())
    }
}
