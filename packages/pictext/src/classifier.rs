//! Zero-shot image classification against a list of candidate labels.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use fastembed::{
    EmbeddingModel, ImageEmbedding, ImageEmbeddingModel, ImageInitOptions, InitOptions,
    TextEmbedding,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ClassifyError;
use crate::image_loader::DecodedImage;

/// CLIP's learned temperature, applied to cosine similarities before softmax.
const LOGIT_SCALE: f32 = 100.0;

/// The single best-scoring candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub label: String,
    pub score: f32,
}

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Scores every candidate label against the image and returns the best one.
    async fn classify(
        &self,
        image: &DecodedImage,
        candidate_labels: &[String],
    ) -> Result<Classification, ClassifyError>;
}

/// Picks the highest score. Ties go to the label that comes first; NaN never wins.
pub fn select_best(labels: &[String], scores: &[f32]) -> Result<Classification, ClassifyError> {
    if labels.is_empty() {
        return Err(ClassifyError::NoCandidates);
    }
    if labels.len() != scores.len() {
        return Err(ClassifyError::ScoreMismatch {
            labels: labels.len(),
            scores: scores.len(),
        });
    }

    let mut best: Option<(usize, f32)> = None;
    for (idx, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if score <= current => {}
            _ => best = Some((idx, score)),
        }
    }

    best.map(|(idx, score)| Classification {
        label: labels[idx].clone(),
        score,
    })
    .ok_or(ClassifyError::NoConfidentLabel)
}

struct ClipModels {
    image: ImageEmbedding,
    text: TextEmbedding,
}

impl ClipModels {
    fn scores(&mut self, image_bytes: &[u8], labels: &[String]) -> Result<Vec<f32>> {
        let image_embedding = self
            .image
            .embed_bytes(&[image_bytes], None)?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Failed to generate image embedding"))?;

        let texts: Vec<&str> = labels.iter().map(String::as_str).collect();
        let label_embeddings = self.text.embed(texts, None)?;

        let logits: Vec<f32> = label_embeddings
            .iter()
            .map(|label| LOGIT_SCALE * cosine_similarity(&image_embedding, label))
            .collect();
        Ok(softmax(&logits))
    }
}

/// CLIP ViT-B/32 zero-shot classifier backed by fastembed.
///
/// Both encoders are loaded once; calls are serialized through a mutex and
/// run on the blocking pool since inference is CPU bound.
pub struct ClipClassifier {
    models: Arc<Mutex<ClipModels>>,
}

impl ClipClassifier {
    pub fn new() -> Result<Self> {
        Self::with_models(ImageEmbeddingModel::ClipVitB32, EmbeddingModel::ClipVitB32)
    }

    /// The two models must share an embedding space.
    pub fn with_models(image_model: ImageEmbeddingModel, text_model: EmbeddingModel) -> Result<Self> {
        let image = ImageEmbedding::try_new(
            ImageInitOptions::new(image_model).with_show_download_progress(true),
        )?;
        let text =
            TextEmbedding::try_new(InitOptions::new(text_model).with_show_download_progress(true))?;
        info!("CLIP classifier loaded");

        Ok(Self {
            models: Arc::new(Mutex::new(ClipModels { image, text })),
        })
    }
}

#[async_trait]
impl Classifier for ClipClassifier {
    async fn classify(
        &self,
        image: &DecodedImage,
        candidate_labels: &[String],
    ) -> Result<Classification, ClassifyError> {
        if candidate_labels.is_empty() {
            return Err(ClassifyError::NoCandidates);
        }

        let models = Arc::clone(&self.models);
        let bytes = image.bytes().to_vec();
        let labels = candidate_labels.to_vec();

        let scores = tokio::task::spawn_blocking(move || {
            let mut models = models
                .lock()
                .map_err(|_| ClassifyError::Model("model lock poisoned".into()))?;
            models
                .scores(&bytes, &labels)
                .map_err(|e| ClassifyError::Model(e.to_string()))
        })
        .await
        .map_err(|e| ClassifyError::Model(e.to_string()))??;

        debug!(?scores, "label scores");
        select_best(candidate_labels, &scores)
    }
}

/// Calculate cosine similarity between two vectors
///
/// Returns a value between -1 and 1, where 1 means identical direction,
/// 0 means orthogonal, and -1 means opposite direction
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return exps;
    }
    exps.into_iter().map(|e| e / sum).collect()
}
