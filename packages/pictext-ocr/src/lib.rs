pub mod azure;
pub mod clova;
pub mod engine;
pub mod region;
pub mod tesseract;

pub use azure::AzureLayoutEngine;
pub use clova::ClovaOcrEngine;
pub use engine::{OcrEngine, OcrError, OcrInput, OcrOutput};
pub use region::{BoundingBox, TextRegion};
pub use tesseract::TesseractEngine;
