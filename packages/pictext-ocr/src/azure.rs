//! Azure AI Document Intelligence, `prebuilt-layout` model.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::engine::{OcrEngine, OcrError, OcrInput, OcrOutput};
use crate::region::TextRegion;

const API_VERSION: &str = "2023-07-31";
const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOperation {
    status: String,
    #[serde(default)]
    analyze_result: Option<AnalyzeResult>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResult {
    #[serde(default)]
    pages: Vec<AnalyzePage>,
}

#[derive(Debug, Deserialize)]
struct AnalyzePage {
    #[serde(default)]
    lines: Vec<AnalyzeLine>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeLine {
    content: String,
}

pub struct AzureLayoutEngine {
    client: Client,
    endpoint: String,
    api_key: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl AzureLayoutEngine {
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> Result<Self, OcrError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            poll_interval: Duration::from_secs(1),
            max_polls: 60,
        })
    }

    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/formrecognizer/documentModels/prebuilt-layout:analyze?api-version={}",
            self.endpoint, API_VERSION
        )
    }

    async fn submit(&self, data: Vec<u8>) -> Result<String, OcrError> {
        let response = self
            .client
            .post(self.analyze_url())
            .header(KEY_HEADER, &self.api_key)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(data)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::ApiError(format!(
                "Azure returned {}: {}",
                status, body
            )));
        }

        response
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| OcrError::ApiError("missing Operation-Location header".into()))
    }

    async fn poll(&self, operation_url: &str) -> Result<AnalyzeResult, OcrError> {
        for attempt in 0..self.max_polls {
            let operation: AnalyzeOperation = self
                .client
                .get(operation_url)
                .header(KEY_HEADER, &self.api_key)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            if let Some(result) = finished(operation)? {
                return Ok(result);
            }
            debug!(attempt, "azure analysis still running");
            tokio::time::sleep(self.poll_interval).await;
        }
        Err(OcrError::ApiError(format!(
            "analysis did not finish after {} polls",
            self.max_polls
        )))
    }
}

/// Returns `Some` once the operation succeeded, `None` while it is pending.
fn finished(operation: AnalyzeOperation) -> Result<Option<AnalyzeResult>, OcrError> {
    match operation.status.as_str() {
        "succeeded" => operation
            .analyze_result
            .map(Some)
            .ok_or_else(|| OcrError::ApiError("succeeded without analyzeResult".into())),
        "failed" => Err(OcrError::ApiError(format!(
            "analysis failed: {}",
            operation.error.unwrap_or_default()
        ))),
        _ => Ok(None),
    }
}

/// One region per page, page lines joined by single spaces.
fn page_regions(result: AnalyzeResult) -> Vec<TextRegion> {
    result
        .pages
        .into_iter()
        .map(|page| {
            let text = page
                .lines
                .iter()
                .map(|l| l.content.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            TextRegion::text(text)
        })
        .collect()
}

#[async_trait]
impl OcrEngine for AzureLayoutEngine {
    fn name(&self) -> &'static str {
        "azure"
    }

    async fn recognize(&self, input: &OcrInput) -> Result<OcrOutput, OcrError> {
        let data = input.load().await?;
        let operation_url = self.submit(data).await?;
        let result = self.poll(&operation_url).await?;
        Ok(OcrOutput::from_regions(page_regions(result)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operation(value: serde_json::Value) -> AnalyzeOperation {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_analyze_url_trims_slash() {
        let engine =
            AzureLayoutEngine::new("https://example.cognitiveservices.azure.com/", "k", Duration::from_secs(5))
                .unwrap();
        assert_eq!(
            engine.analyze_url(),
            "https://example.cognitiveservices.azure.com/formrecognizer/documentModels/prebuilt-layout:analyze?api-version=2023-07-31"
        );
    }

    #[test]
    fn test_running_operation_is_pending() {
        let op = operation(serde_json::json!({"status": "running"}));
        assert!(finished(op).unwrap().is_none());
    }

    #[test]
    fn test_failed_operation_is_error() {
        let op = operation(serde_json::json!({"status": "failed", "error": {"code": "InvalidImage"}}));
        let err = finished(op).unwrap_err();
        assert!(err.to_string().contains("InvalidImage"));
    }

    #[test]
    fn test_succeeded_operation_pages_joined() {
        let op = operation(serde_json::json!({
            "status": "succeeded",
            "analyzeResult": {
                "content": "ignored",
                "pages": [
                    {"pageNumber": 1, "lines": [{"content": "첫 줄"}, {"content": "second line"}]},
                    {"pageNumber": 2, "lines": [{"content": "page two"}]}
                ]
            }
        }));
        let result = finished(op).unwrap().unwrap();
        let output = OcrOutput::from_regions(page_regions(result));
        assert_eq!(output.regions.len(), 2);
        assert_eq!(output.text, "첫 줄 second line page two");
    }
}
