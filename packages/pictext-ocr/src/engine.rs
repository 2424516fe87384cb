use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::region::TextRegion;

#[derive(Debug, Clone)]
pub enum OcrInput {
    FilePath(PathBuf),
    Bytes(Vec<u8>),
}

impl OcrInput {
    /// Loads the image bytes, reading from disk for `FilePath`.
    pub async fn load(&self) -> Result<Vec<u8>, OcrError> {
        match self {
            OcrInput::Bytes(data) => Ok(data.clone()),
            OcrInput::FilePath(path) => tokio::fs::read(path).await.map_err(|e| {
                OcrError::InvalidInput(format!("failed to read {}: {e}", path.display()))
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OcrOutput {
    pub text: String,
    pub regions: Vec<TextRegion>,
}

impl OcrOutput {
    /// Builds the output text by joining region texts with a single space,
    /// in the order the engine reported them.
    pub fn from_regions(regions: Vec<TextRegion>) -> Self {
        let text = regions
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self { text, regions }
    }
}

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("engine error: {0}")]
    EngineError(String),
    #[error("api error: {0}")]
    ApiError(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    async fn recognize(&self, input: &OcrInput) -> Result<OcrOutput, OcrError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(text: &str) -> TextRegion {
        TextRegion {
            text: text.to_string(),
            bounding_box: None,
            confidence: None,
        }
    }

    #[test]
    fn test_from_regions_joins_with_single_space() {
        let output = OcrOutput::from_regions(vec![region("안녕하세요"), region("hello"), region("world")]);
        assert_eq!(output.text, "안녕하세요 hello world");
        assert_eq!(output.regions.len(), 3);
    }

    #[test]
    fn test_from_regions_empty() {
        let output = OcrOutput::from_regions(Vec::new());
        assert!(output.text.is_empty());
        assert!(output.regions.is_empty());
    }

    #[tokio::test]
    async fn test_load_bytes() {
        let input = OcrInput::Bytes(vec![1, 2, 3]);
        assert_eq!(input.load().await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let input = OcrInput::FilePath(PathBuf::from("/definitely/not/here.png"));
        let err = input.load().await.unwrap_err();
        assert!(matches!(err, OcrError::InvalidInput(_)));
    }
}
