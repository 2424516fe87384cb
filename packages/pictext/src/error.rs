use pictext_ocr::OcrError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("no candidate labels supplied")]
    NoCandidates,

    #[error("classifier returned {scores} scores for {labels} labels")]
    ScoreMismatch { labels: usize, scores: usize },

    #[error("no candidate received a usable score")]
    NoConfidentLabel,

    #[error("classification model failed: {0}")]
    Model(String),
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("OCR failed: {0}")]
    Ocr(#[from] OcrError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{0} returned no content")]
    EmptyResponse(&'static str),
}

/// Why a conversion fell back to returning its input.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("classification failed: {0}")]
    Classification(#[from] ClassifyError),

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractError),
}
