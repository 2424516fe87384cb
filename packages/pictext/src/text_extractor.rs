use async_trait::async_trait;
use pictext_ocr::{OcrEngine, OcrInput};
use tracing::debug;

use crate::error::ExtractError;

#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Runs OCR over the encoded image bytes and returns the detected
    /// fragments joined by single spaces, in engine order.
    async fn extract(&self, binary_image: &[u8]) -> Result<String, ExtractError>;
}

/// Adapts any [`OcrEngine`] to the dispatcher's text path.
pub struct OcrTextExtractor<E> {
    engine: E,
}

impl<E: OcrEngine> OcrTextExtractor<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl<E: OcrEngine> TextExtractor for OcrTextExtractor<E> {
    async fn extract(&self, binary_image: &[u8]) -> Result<String, ExtractError> {
        let output = self
            .engine
            .recognize(&OcrInput::Bytes(binary_image.to_vec()))
            .await?;
        debug!(
            engine = self.engine.name(),
            regions = output.regions.len(),
            "ocr complete"
        );
        Ok(output.text)
    }
}
