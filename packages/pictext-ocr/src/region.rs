/// Pixel-space box of a recognized fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A single text fragment as returned by an engine.
#[derive(Debug, Clone)]
pub struct TextRegion {
    pub text: String,
    pub bounding_box: Option<BoundingBox>,
    /// Normalized to 0..1 when the engine reports one.
    pub confidence: Option<f32>,
}

impl TextRegion {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bounding_box: None,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }
}
