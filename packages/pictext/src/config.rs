//! Runtime settings, read from flags or the environment (`.env` supported).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use pictext_ocr::{AzureLayoutEngine, ClovaOcrEngine, TesseractEngine};
use tracing::info;

use crate::captioner::{
    Captioner, GeminiCaptioner, DEFAULT_CAPTION_PROMPT, DEFAULT_GEMINI_BASE_URL,
    DEFAULT_GEMINI_MODEL,
};
use crate::category::CategoryTable;
use crate::classifier::{Classifier, ClipClassifier};
use crate::dispatcher::{Collaborators, Dispatcher};
use crate::formula::{FormulaExtractor, VlmFormulaExtractor, DEFAULT_FORMULA_MODEL};
use crate::text_extractor::{OcrTextExtractor, TextExtractor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OcrEngineKind {
    /// Local `tesseract` binary
    Tesseract,
    /// Naver Clova OCR
    Clova,
    /// Azure AI Document Intelligence (prebuilt-layout)
    Azure,
}

#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Gemini API key used for captions
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub google_api_key: Option<String>,

    /// Gemini model used for captions
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    pub gemini_model: String,

    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_GEMINI_BASE_URL)]
    pub gemini_base_url: String,

    /// Instruction sent with graph images
    #[arg(long, env = "CAPTION_PROMPT", default_value = DEFAULT_CAPTION_PROMPT)]
    pub caption_prompt: String,

    /// OpenAI-compatible server hosting the formula model
    #[arg(long, env = "FORMULA_ENDPOINT", default_value = "http://localhost:8081")]
    pub formula_endpoint: String,

    #[arg(long, env = "FORMULA_MODEL", default_value = DEFAULT_FORMULA_MODEL)]
    pub formula_model: String,

    /// OCR backend for text images
    #[arg(long, env = "OCR_ENGINE", value_enum, default_value_t = OcrEngineKind::Tesseract)]
    pub ocr_engine: OcrEngineKind,

    #[arg(long, env = "TESSERACT_LANG", default_value = pictext_ocr::tesseract::DEFAULT_LANGUAGE)]
    pub tesseract_lang: String,

    /// Clova OCR invoke URL
    #[arg(long, env = "NAVER_OCR_URL")]
    pub naver_ocr_url: Option<String>,

    #[arg(long, env = "NAVER_API_KEY", hide_env_values = true)]
    pub naver_api_key: Option<String>,

    #[arg(long, env = "AZURE_COGNITIVE_API_ENDPOINT")]
    pub azure_endpoint: Option<String>,

    #[arg(long, env = "AZURE_COGNITIVE_API_KEY", hide_env_values = true)]
    pub azure_api_key: Option<String>,

    /// JSON file replacing the built-in category table
    #[arg(long, env = "PICTEXT_CATEGORIES")]
    pub categories: Option<PathBuf>,

    /// Timeout applied to every outbound HTTP request
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 120)]
    pub http_timeout_secs: u64,
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn category_table(&self) -> Result<CategoryTable> {
        match &self.categories {
            Some(path) => CategoryTable::from_json_file(path),
            None => Ok(CategoryTable::default()),
        }
    }

    pub fn text_extractor(&self) -> Result<Arc<dyn TextExtractor>> {
        let extractor: Arc<dyn TextExtractor> = match self.ocr_engine {
            OcrEngineKind::Tesseract => Arc::new(OcrTextExtractor::new(TesseractEngine::new(
                &self.tesseract_lang,
            ))),
            OcrEngineKind::Clova => {
                let url = self
                    .naver_ocr_url
                    .as_deref()
                    .context("NAVER_OCR_URL is required for the clova OCR engine")?;
                let secret = self
                    .naver_api_key
                    .as_deref()
                    .context("NAVER_API_KEY is required for the clova OCR engine")?;
                Arc::new(OcrTextExtractor::new(ClovaOcrEngine::new(
                    url,
                    secret,
                    self.timeout(),
                )?))
            }
            OcrEngineKind::Azure => {
                let endpoint = self
                    .azure_endpoint
                    .as_deref()
                    .context("AZURE_COGNITIVE_API_ENDPOINT is required for the azure OCR engine")?;
                let key = self
                    .azure_api_key
                    .as_deref()
                    .context("AZURE_COGNITIVE_API_KEY is required for the azure OCR engine")?;
                Arc::new(OcrTextExtractor::new(AzureLayoutEngine::new(
                    endpoint,
                    key,
                    self.timeout(),
                )?))
            }
        };
        info!(engine = ?self.ocr_engine, "OCR engine selected");
        Ok(extractor)
    }

    pub fn formula_extractor(&self) -> Result<Arc<dyn FormulaExtractor>> {
        let extractor =
            VlmFormulaExtractor::new(&self.formula_endpoint, &self.formula_model, self.timeout())?;
        Ok(Arc::new(extractor))
    }

    pub fn captioner(&self) -> Result<Arc<dyn Captioner>> {
        let api_key = self
            .google_api_key
            .as_deref()
            .context("GOOGLE_API_KEY is required for captioning")?;
        let captioner = GeminiCaptioner::new(api_key, self.timeout())?
            .with_base_url(&self.gemini_base_url)
            .with_model(&self.gemini_model)
            .with_prompt(&self.caption_prompt);
        Ok(Arc::new(captioner))
    }

    pub fn classifier(&self) -> Result<Arc<dyn Classifier>> {
        let classifier = ClipClassifier::new().context("Failed to initialize CLIP classifier")?;
        Ok(Arc::new(classifier))
    }

    /// Builds every collaborator once. Remote handles are validated before
    /// the local models are loaded so missing credentials fail fast.
    pub fn build_dispatcher(&self) -> Result<Dispatcher> {
        let table = self.category_table()?;
        let text = self.text_extractor()?;
        let formula = self.formula_extractor()?;
        let captioner = self.captioner()?;
        let classifier = self.classifier()?;

        Ok(Dispatcher::new(
            table,
            Collaborators {
                classifier,
                text,
                formula,
                captioner,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        settings: Settings,
    }

    fn parse(args: &[&str]) -> Settings {
        let mut argv = vec!["pictext"];
        argv.extend_from_slice(args);
        Harness::try_parse_from(argv).unwrap().settings
    }

    #[test]
    fn test_explicit_flags() {
        let settings = parse(&[
            "--google-api-key",
            "k",
            "--ocr-engine",
            "azure",
            "--http-timeout-secs",
            "7",
            "--formula-endpoint",
            "http://formula:9000",
        ]);
        assert_eq!(settings.google_api_key.as_deref(), Some("k"));
        assert_eq!(settings.ocr_engine, OcrEngineKind::Azure);
        assert_eq!(settings.timeout(), Duration::from_secs(7));
        assert_eq!(settings.formula_endpoint, "http://formula:9000");
    }

    #[test]
    fn test_clova_requires_credentials() {
        let mut settings = parse(&[]);
        settings.ocr_engine = OcrEngineKind::Clova;
        settings.naver_ocr_url = None;
        let err = settings.text_extractor().err().unwrap();
        assert!(err.to_string().contains("NAVER_OCR_URL"));
    }

    #[test]
    fn test_captioner_requires_key() {
        let mut settings = parse(&[]);
        settings.google_api_key = None;
        let err = settings.captioner().err().unwrap();
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn test_custom_category_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("categories.json");
        std::fs::write(&path, r#"{"Formula": ["an integral"], "Text": ["a receipt"]}"#).unwrap();

        let mut settings = parse(&[]);
        settings.categories = Some(path);
        let table = settings.category_table().unwrap();
        assert_eq!(table.candidate_labels(), vec!["an integral", "a receipt"]);
    }
}
