//! Natural-language captions from the Gemini `generateContent` API.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ExtractError;
use crate::image_loader::DecodedImage;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// "Briefly describe this graph."
pub const DEFAULT_CAPTION_PROMPT: &str = "이 그래프에 대한 설명을 간단하게 적어줘.";

#[async_trait]
pub trait Captioner: Send + Sync {
    async fn caption(&self, image: &DecodedImage) -> Result<String, ExtractError>;
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart {
    InlineData { inline_data: InlineData },
    Text { text: String },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn text(self) -> Option<String> {
        let parts = self.candidates.into_iter().next()?.content?.parts;
        let text: String = parts.into_iter().filter_map(|p| p.text).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

pub struct GeminiCaptioner {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    prompt: String,
}

impl GeminiCaptioner {
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self, ExtractError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            prompt: DEFAULT_CAPTION_PROMPT.to_string(),
        })
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_prompt(mut self, prompt: &str) -> Self {
        self.prompt = prompt.to_string();
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn request(&self, image: &DecodedImage) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    RequestPart::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type().to_string(),
                            data: STANDARD.encode(image.bytes()),
                        },
                    },
                    RequestPart::Text {
                        text: self.prompt.clone(),
                    },
                ],
            }],
        }
    }
}

#[async_trait]
impl Captioner for GeminiCaptioner {
    async fn caption(&self, image: &DecodedImage) -> Result<String, ExtractError> {
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request(image))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::Api {
                service: "gemini",
                status,
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let caption = parsed.text().ok_or(ExtractError::EmptyResponse("gemini"))?;
        info!(model = %self.model, chars = caption.chars().count(), "caption generated");

        Ok(caption)
    }
}
