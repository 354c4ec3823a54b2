use crate::companion::{
    system_prompt, user_message, Companion, CompanionError, CompanionReply, CompanionRequest,
};
use crate::util::{is_http_retryable, retry_with_backoff, RetryConfig};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const MODEL: &str = "gpt-4o-mini";
const MAX_TOKENS: u32 = 150;
const TEMPERATURE: f32 = 0.7;
const PRESENCE_PENALTY: f32 = 0.1;
const FREQUENCY_PENALTY: f32 = 0.1;

/// Chat-completions client for the hosted reply generator.
#[derive(Clone)]
pub struct HostedCompanion {
    client: Client,
    api_key: String,
    base_url: String,
    retry: RetryConfig,
}

impl HostedCompanion {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn request_once(
        &self,
        request: &CompanionRequest,
    ) -> Result<CompanionReply, CompanionError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt(&request.emotion, request.confidence),
                },
                ChatMessage {
                    role: "user",
                    content: user_message(request),
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            presence_penalty: PRESENCE_PENALTY,
            frequency_penalty: FREQUENCY_PENALTY,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(CompanionError::HttpStatus(status.as_u16(), detail));
        }

        let parsed: ChatResponse = response.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_owned())
            .filter(|t| !t.is_empty())
            .ok_or(CompanionError::EmptyResponse)?;

        Ok(CompanionReply { text })
    }
}

fn is_retryable(error: &CompanionError) -> bool {
    match error {
        CompanionError::HttpStatus(status, _) => is_http_retryable(*status),
        CompanionError::Http(e) => e.is_timeout() || e.is_connect(),
        CompanionError::EmptyResponse => false,
    }
}

impl Companion for HostedCompanion {
    fn respond(
        &self,
        request: CompanionRequest,
    ) -> BoxFuture<'_, Result<CompanionReply, CompanionError>> {
        let this = self.clone();
        async move {
            retry_with_backoff(&this.retry, || this.request_once(&request), is_retryable).await
        }
        .boxed()
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: &'static str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    presence_penalty: f32,
    frequency_penalty: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}
