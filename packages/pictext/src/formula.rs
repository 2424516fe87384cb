//! Formula-to-LaTeX extraction through an OpenAI-compatible vision model server.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ExtractError;
use crate::image_loader::DecodedImage;

/// Instruction sent with every formula image.
pub const FORMULA_INSTRUCTION: &str = "Extract mathematical expressions in LaTeX format";

/// Default model served behind the formula endpoint.
pub const DEFAULT_FORMULA_MODEL: &str = "ds4sd/SmolDocling-256M-preview";

const MAX_NEW_TOKENS: u32 = 500;

/// Cleanup applied to raw model output, in order.
///
/// The first pattern is the chat template echo the formula model prepends to
/// its answer and must match the prompt above exactly.
static CLEANUP_PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();

fn cleanup_patterns() -> &'static Vec<(Regex, &'static str)> {
    CLEANUP_PATTERNS.get_or_init(|| {
        [
            (
                r"User:\s*Extract mathematical expressions in LaTeX format\s*Assistant: 0>0>500>500>",
                "",
            ),
            (r"\\, \.(\n?)$", "$1"),
        ]
        .into_iter()
        .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
        .collect()
    })
}

/// Strips the prompt echo and trailing `\, .` artifact, then wraps the
/// remainder in `$...$`. Empty input yields `$$`.
pub fn convert_text_to_latex(text: &str) -> String {
    let mut result = text.to_string();
    for (re, replacement) in cleanup_patterns() {
        result = re.replace_all(&result, *replacement).into_owned();
    }
    format!("${result}$")
}

#[async_trait]
pub trait FormulaExtractor: Send + Sync {
    /// Returns the formula as `$<latex>$`.
    async fn extract(&self, image: &DecodedImage) -> Result<String, ExtractError>;
}

// --- OpenAI-compatible serde structs ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: serde_json::Value,
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
    #[serde(default)]
    content: Option<String>,
}

/// Builds the single user turn: the image followed by the instruction.
fn formula_messages(data_url: &str) -> Vec<ChatMessage> {
    vec![ChatMessage {
        role: "user",
        content: serde_json::json!([
            {"type": "image_url", "image_url": {"url": data_url}},
            {"type": "text", "text": FORMULA_INSTRUCTION}
        ]),
    }]
}

/// Sends formula images to a sidecar serving the formula model via `/v1/chat/completions`.
pub struct VlmFormulaExtractor {
    client: Client,
    endpoint: String,
    model_name: String,
}

impl VlmFormulaExtractor {
    pub fn new(endpoint: &str, model_name: &str, timeout: Duration) -> Result<Self, ExtractError> {
        let client = Client::builder().timeout(timeout).build()?;

        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!(
            "Formula model configured: endpoint={}, model={}",
            endpoint, model_name
        );

        Ok(Self {
            client,
            endpoint,
            model_name: model_name.to_string(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn request(&self, image: &DecodedImage) -> ChatRequest {
        let data_url = format!(
            "data:{};base64,{}",
            image.mime_type(),
            STANDARD.encode(image.bytes())
        );
        ChatRequest {
            model: self.model_name.clone(),
            messages: formula_messages(&data_url),
            max_tokens: MAX_NEW_TOKENS,
            temperature: 0.0,
        }
    }
}

#[async_trait]
impl FormulaExtractor for VlmFormulaExtractor {
    async fn extract(&self, image: &DecodedImage) -> Result<String, ExtractError> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.endpoint))
            .json(&self.request(image))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::Api {
                service: "formula model",
                status,
                body,
            });
        }

        let chat_response: ChatResponse = response.json().await?;
        let raw = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ExtractError::EmptyResponse("formula model"))?;
        debug!(raw = %raw, "formula model output");

        Ok(convert_text_to_latex(&raw))
    }
}
