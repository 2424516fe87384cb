//! Classification-to-handler routing.
//!
//! An encoded image is decoded, classified against the full candidate label
//! set, and handed to the extractor that owns the winning label's category:
//!
//! - `Text` → OCR, fragments joined by spaces
//! - `Formula` → LaTeX wrapped as `$...$`
//! - anything else → caption
//!
//! Decode failures produce no result. Any later failure degrades to the
//! original input, reported through [`Conversion::Degraded`].

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::category::{Category, CategoryTable};
use crate::classifier::{Classification, Classifier};
use crate::captioner::Captioner;
use crate::error::{ClassifyError, ConvertError};
use crate::formula::FormulaExtractor;
use crate::image_loader::{decode_base64_image, DecodedImage, ImageError};
use crate::text_extractor::TextExtractor;

/// Model and API handles, built once at startup and shared by every call.
#[derive(Clone)]
pub struct Collaborators {
    pub classifier: Arc<dyn Classifier>,
    pub text: Arc<dyn TextExtractor>,
    pub formula: Arc<dyn FormulaExtractor>,
    pub captioner: Arc<dyn Captioner>,
}

/// Outcome of [`Dispatcher::convert`].
#[derive(Debug)]
pub enum Conversion {
    /// The category handler produced a result.
    Extracted {
        category: Category,
        label: String,
        score: f32,
        text: String,
    },
    /// Classification or extraction failed; `input` is the untouched payload.
    Degraded { input: String, error: ConvertError },
    /// The payload is not a decodable image. There is no result.
    Rejected(ImageError),
}

impl Conversion {
    /// The plain string contract: extracted text, the original input on
    /// degradation, `None` when the image could not be decoded.
    pub fn into_text(self) -> Option<String> {
        match self {
            Conversion::Extracted { text, .. } => Some(text),
            Conversion::Degraded { input, .. } => Some(input),
            Conversion::Rejected(_) => None,
        }
    }

    pub fn is_extracted(&self) -> bool {
        matches!(self, Conversion::Extracted { .. })
    }

    pub fn report(&self) -> ConversionReport {
        match self {
            Conversion::Extracted {
                category,
                label,
                score,
                text,
            } => ConversionReport {
                status: "extracted",
                category: Some(*category),
                label: Some(label.clone()),
                score: Some(*score),
                text: Some(text.clone()),
                error: None,
            },
            Conversion::Degraded { input, error } => ConversionReport {
                status: "degraded",
                category: None,
                label: None,
                score: None,
                text: Some(input.clone()),
                error: Some(error.to_string()),
            },
            Conversion::Rejected(err) => ConversionReport {
                status: "rejected",
                category: None,
                label: None,
                score: None,
                text: None,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Serializable view of a [`Conversion`].
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A classification mapped back onto its category.
#[derive(Debug, Clone, Serialize)]
pub struct CategorizedLabel {
    pub category: Category,
    pub label: String,
    pub score: f32,
}

/// Classifies a decoded image and maps the winning label onto its category.
pub async fn categorize(
    classifier: &dyn Classifier,
    table: &CategoryTable,
    image: &DecodedImage,
) -> Result<CategorizedLabel, ClassifyError> {
    let Classification { label, score } = classifier
        .classify(image, &table.candidate_labels())
        .await
        .map_err(|e| {
            error!("Failed to classify image: {}", e);
            e
        })?;
    let category = table.category_of(&label);
    info!(%category, score, "classified image as {}", label);

    Ok(CategorizedLabel {
        category,
        label,
        score,
    })
}

pub struct Dispatcher {
    table: CategoryTable,
    collaborators: Collaborators,
}

impl Dispatcher {
    pub fn new(table: CategoryTable, collaborators: Collaborators) -> Self {
        Self {
            table,
            collaborators,
        }
    }

    /// Converts an encoded image into text. Never panics or returns an error;
    /// see [`Conversion`] for the three outcomes.
    pub async fn convert(&self, encoded_image: &str) -> Conversion {
        let image = match decode_base64_image(encoded_image) {
            Ok(image) => {
                info!(
                    width = image.width(),
                    height = image.height(),
                    "image decoded"
                );
                image
            }
            Err(e) => {
                error!("Failed to decode image: {}", e);
                return Conversion::Rejected(e);
            }
        };

        match self.route(&image).await {
            Ok((classified, text)) => Conversion::Extracted {
                category: classified.category,
                label: classified.label,
                score: classified.score,
                text,
            },
            Err(e) => {
                warn!("Returning input unchanged: {}", e);
                Conversion::Degraded {
                    input: encoded_image.to_string(),
                    error: e,
                }
            }
        }
    }

    async fn route(&self, image: &DecodedImage) -> Result<(CategorizedLabel, String), ConvertError> {
        let classified =
            categorize(self.collaborators.classifier.as_ref(), &self.table, image).await?;

        let text = match classified.category {
            Category::Text => self.collaborators.text.extract(image.bytes()).await?,
            Category::Formula => self.collaborators.formula.extract(image).await?,
            Category::Graph => self.collaborators.captioner.caption(image).await?,
        };

        Ok((classified, text))
    }
}
