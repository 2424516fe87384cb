//! Naver Clova OCR (general V2 API).

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{OcrEngine, OcrError, OcrInput, OcrOutput};
use crate::region::TextRegion;

#[derive(Serialize)]
struct ClovaMessage {
    images: Vec<ClovaImage>,
    #[serde(rename = "requestId")]
    request_id: String,
    version: &'static str,
    timestamp: u64,
}

#[derive(Serialize)]
struct ClovaImage {
    format: String,
    name: String,
}

#[derive(Deserialize)]
struct ClovaResponse {
    #[serde(default)]
    images: Vec<ClovaImageResult>,
}

#[derive(Deserialize)]
struct ClovaImageResult {
    #[serde(rename = "inferResult", default)]
    infer_result: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    fields: Vec<ClovaField>,
}

#[derive(Deserialize)]
struct ClovaField {
    #[serde(rename = "inferText")]
    infer_text: String,
    #[serde(rename = "inferConfidence", default)]
    infer_confidence: Option<f32>,
}

pub struct ClovaOcrEngine {
    client: Client,
    invoke_url: String,
    secret: String,
    format: String,
}

impl ClovaOcrEngine {
    pub fn new(invoke_url: &str, secret: &str, timeout: Duration) -> Result<Self, OcrError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            invoke_url: invoke_url.to_string(),
            secret: secret.to_string(),
            format: "jpg".to_string(),
        })
    }

    /// Overrides the image format declared in the request message.
    pub fn with_format(mut self, format: &str) -> Self {
        self.format = format.to_string();
        self
    }

    fn message(&self) -> ClovaMessage {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        ClovaMessage {
            images: vec![ClovaImage {
                format: self.format.clone(),
                name: "pictext".to_string(),
            }],
            request_id: uuid::Uuid::new_v4().to_string(),
            version: "V2",
            timestamp,
        }
    }
}

#[async_trait]
impl OcrEngine for ClovaOcrEngine {
    fn name(&self) -> &'static str {
        "clova"
    }

    async fn recognize(&self, input: &OcrInput) -> Result<OcrOutput, OcrError> {
        let data = input.load().await?;
        let message = serde_json::to_string(&self.message())
            .map_err(|e| OcrError::InvalidInput(e.to_string()))?;

        let form = Form::new().text("message", message).part(
            "file",
            Part::bytes(data).file_name(format!("pictext.{}", self.format)),
        );

        let response = self
            .client
            .post(&self.invoke_url)
            .header("X-OCR-SECRET", &self.secret)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::ApiError(format!(
                "Clova returned {}: {}",
                status, body
            )));
        }

        let parsed: ClovaResponse = response.json().await?;
        let regions = collect_regions(parsed)?;
        debug!(regions = regions.len(), "clova finished");

        Ok(OcrOutput::from_regions(regions))
    }
}

fn collect_regions(response: ClovaResponse) -> Result<Vec<TextRegion>, OcrError> {
    let mut regions = Vec::new();
    for image in response.images {
        if let Some(result) = image.infer_result.as_deref() {
            if result != "SUCCESS" {
                return Err(OcrError::ApiError(format!(
                    "Clova inference {}: {}",
                    result,
                    image.message.unwrap_or_default()
                )));
            }
        }
        regions.extend(image.fields.into_iter().map(|field| {
            let region = TextRegion::text(field.infer_text);
            match field.infer_confidence {
                Some(c) => region.with_confidence(c),
                None => region,
            }
        }));
    }
    Ok(regions)
}
