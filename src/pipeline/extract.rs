//! Structured extraction: send an instruction + page image, get a record back.
//!
//! [`StructuredExtractor`] is the provider seam. It knows nothing about
//! account statements: it takes an instruction, an image and an
//! [`OutputSchema`] and returns a JSON object. [`extract`] layers the typed
//! contract on top: it checks the object against the schema and deserialises
//! it into the caller's [`ExtractionTarget`].
//!
//! [`AzureOpenAiExtractor`] is the production provider. It uses the
//! chat-completions API with `response_format: json_schema` in strict mode,
//! so the model must answer with exactly the declared fields rather than
//! free text. No retry is attempted here; a failure ends processing of the
//! one document being handled.

use crate::config::AzureOpenAiConfig;
use crate::error::{ExtractError, PipelineError};
use crate::pipeline::encode::ImageData;
use crate::prompts::SYSTEM_PROMPT;
use crate::schema::{ExtractionTarget, OutputSchema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;

/// Everything a provider needs for one extraction call.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionRequest<'a> {
    pub instruction: &'a str,
    pub image: &'a ImageData,
    pub schema: &'a OutputSchema,
}

/// A service that answers an instruction about an image with a JSON object
/// shaped by a declared schema.
#[async_trait]
pub trait StructuredExtractor: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    /// Submit one request and return the service's parsed object.
    async fn submit(&self, request: &ExtractionRequest<'_>) -> Result<Value, ExtractError>;
}

/// Ask `extractor` for a `T` and validate the answer against `T::schema()`.
pub async fn extract<T: ExtractionTarget>(
    extractor: &dyn StructuredExtractor,
    instruction: &str,
    image: &ImageData,
) -> Result<T, ExtractError> {
    let schema = T::schema();
    let request = ExtractionRequest {
        instruction,
        image,
        schema: &schema,
    };

    let value = extractor.submit(&request).await?;

    let mismatch = |detail: String| ExtractError::SchemaMismatch {
        schema: schema.name.clone(),
        detail,
    };
    schema.validate(&value).map_err(mismatch)?;
    serde_json::from_value(value).map_err(|e| mismatch(e.to_string()))
}

// ── Azure OpenAI ─────────────────────────────────────────────────────────

/// [`StructuredExtractor`] for an Azure OpenAI vision deployment.
pub struct AzureOpenAiExtractor {
    client: reqwest::Client,
    config: AzureOpenAiConfig,
}

impl AzureOpenAiExtractor {
    pub fn new(config: AzureOpenAiConfig) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PipelineError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Use a caller-built HTTP client (proxy, TLS or timeout settings).
    pub fn with_client(config: AzureOpenAiConfig, client: reqwest::Client) -> Self {
        Self { client, config }
    }

    /// Configure from `AOAI_*` environment variables.
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::new(AzureOpenAiConfig::from_env()?)
    }

    pub fn config(&self) -> &AzureOpenAiConfig {
        &self.config
    }
}

#[async_trait]
impl StructuredExtractor for AzureOpenAiExtractor {
    fn name(&self) -> &str {
        "azure-openai"
    }

    async fn submit(&self, request: &ExtractionRequest<'_>) -> Result<Value, ExtractError> {
        let start = Instant::now();
        let body = build_chat_request(&self.config, request);

        let response = self
            .client
            .post(self.config.chat_completions_url())
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ExtractError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = error_message(&text);
            return Err(match status.as_u16() {
                401 | 403 => ExtractError::Auth {
                    status: status.as_u16(),
                    detail,
                },
                code => ExtractError::Api {
                    status: code,
                    detail,
                },
            });
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExtractError::MalformedResponse(e.to_string()))?;

        if let Some(usage) = &completion.usage {
            debug!(
                "{}: {} input tokens, {} output tokens, {:?}",
                self.config.deployment,
                usage.prompt_tokens,
                usage.completion_tokens,
                start.elapsed()
            );
        }

        parse_completion(completion)
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat<'a>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
enum ChatMessage<'a> {
    System { content: &'a str },
    User { content: Vec<ContentPart<'a>> },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    strict: bool,
    schema: Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// Message layout: system prompt, then one user turn holding the instruction
/// text followed by the page image.
fn build_chat_request<'a>(
    config: &AzureOpenAiConfig,
    request: &ExtractionRequest<'a>,
) -> ChatRequest<'a> {
    ChatRequest {
        messages: vec![
            ChatMessage::System {
                content: SYSTEM_PROMPT,
            },
            ChatMessage::User {
                content: vec![
                    ContentPart::Text {
                        text: request.instruction,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: request.image.to_data_uri(),
                        },
                    },
                ],
            },
        ],
        max_tokens: config.max_tokens,
        temperature: config.temperature,
        response_format: ResponseFormat {
            kind: "json_schema",
            json_schema: JsonSchemaFormat {
                name: &request.schema.name,
                strict: true,
                schema: request.schema.to_json_schema(),
            },
        },
    }
}

fn parse_completion(completion: ChatResponse) -> Result<Value, ExtractError> {
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ExtractError::MalformedResponse("response has no choices".into()))?;

    if let Some(refusal) = choice.message.refusal.filter(|r| !r.is_empty()) {
        return Err(ExtractError::Refused(refusal));
    }
    if let Some(reason) = choice.finish_reason.filter(|r| r != "stop") {
        return Err(ExtractError::Incomplete(reason));
    }

    let content = choice
        .message
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ExtractError::MalformedResponse("message has no content".into()))?;

    serde_json::from_str(&content)
        .map_err(|e| ExtractError::MalformedResponse(format!("content is not JSON: {e}")))
}

/// Pull `error.message` out of an Azure error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
