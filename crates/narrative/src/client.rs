use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::NarrativeError;
use crate::prompt::Prompt;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A chat model that answers a cluster prompt with a JSON string.
pub trait LanguageModel: Send + Sync {
    fn complete(&self, prompt: &Prompt) -> BoxFuture<'_, Result<String, NarrativeError>>;
}

pub const SYSTEM_INSTRUCTION: &str = "You are a site-selection analyst for new healthcare \
facilities. You receive k-means clusters of census tracts as JSON; each cluster lists its \
centroid value per attribute. Give every cluster a short descriptive name and a one-paragraph \
reasoning about its suitability. Answer with a JSON object of the form \
{\"clusters\": [{\"id\": string, \"name\": string, \"reasoning\": string}]} containing one entry \
per input cluster, in input order, echoing each cluster's id.";

#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

/// OpenAI-compatible `chat/completions` endpoint.
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

impl LanguageModel for OpenAiClient {
    fn complete(&self, prompt: &Prompt) -> BoxFuture<'_, Result<String, NarrativeError>> {
        let user = prompt.to_json();
        Box::pin(async move {
            let body = ChatRequest {
                model: &self.config.model,
                messages: [
                    ChatMessage {
                        role: "system",
                        content: SYSTEM_INSTRUCTION,
                    },
                    ChatMessage {
                        role: "user",
                        content: &user,
                    },
                ],
                response_format: ResponseFormat {
                    kind: "json_object",
                },
            };
            debug!(model = %self.config.model, bytes = user.len(), "chat completion request");

            let resp = self
                .client
                .post(self.endpoint())
                .bearer_auth(&self.config.api_key)
                .json(&body)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(NarrativeError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let reply: ChatResponse = resp.json().await?;
            reply
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or(NarrativeError::MissingContent)
        })
    }
}
